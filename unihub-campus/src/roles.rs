use crate::{ClubAdminStatus, UserData};

/// What a user is allowed to act as. Never stored; derived from the
/// persisted flags on every request so admin actions apply immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    ClubAdmin,
    SysAdmin,
}

impl Role {
    /// Derives the user's effective role.
    ///
    /// sysAdmin takes precedence over any club admin standing, and a user
    /// with an unresolved (pending) or rejected application has no usable
    /// role at all. `None` must never fall back to [Role::Student].
    pub fn resolve(user: &UserData) -> Option<Role> {
        if user.is_sys_admin {
            return Some(Role::SysAdmin);
        }

        match user.club_admin_status {
            ClubAdminStatus::Accepted => Some(Role::ClubAdmin),
            ClubAdminStatus::NeverApplied => Some(Role::Student),
            ClubAdminStatus::Pending | ClubAdminStatus::Rejected => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::ClubAdmin => "clubAdmin",
            Role::SysAdmin => "sysAdmin",
        }
    }
}
