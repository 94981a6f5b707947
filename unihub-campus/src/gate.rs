use thiserror::Error;

use crate::{ClubAdminStatus, Role, UserData};

/// Accept any usable role.
pub const ANY_ROLE: &[Role] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Your account is banned.")]
    Banned,
    #[error("Please verify your email first.")]
    Unverified,
    #[error("Your club admin application is pending review.")]
    ApplicationPending,
    #[error("Your club admin application was rejected.")]
    ApplicationRejected,
    #[error("Forbidden")]
    Forbidden,
}

/// Decides whether the user may act in one of the required roles.
///
/// The ban check comes first and is independent of role, so it applies to
/// sysAdmins too and takes effect on the next request after an admin bans a
/// logged-in user. An empty `required` slice accepts any usable role.
pub fn authorize(user: &UserData, required: &[Role]) -> Result<Role, AccessError> {
    if user.is_banned {
        return Err(AccessError::Banned);
    }

    if !user.is_verified {
        return Err(AccessError::Unverified);
    }

    let role = match Role::resolve(user) {
        Some(role) => role,
        None => {
            return Err(match user.club_admin_status {
                ClubAdminStatus::Rejected => AccessError::ApplicationRejected,
                _ => AccessError::ApplicationPending,
            })
        }
    };

    if !required.is_empty() && !required.contains(&role) {
        return Err(AccessError::Forbidden);
    }

    Ok(role)
}

#[cfg(test)]
mod test {
    use super::{authorize, AccessError, ANY_ROLE};
    use crate::{ClubAdminStatus, Role, UserData};
    use chrono::Utc;

    fn user() -> UserData {
        UserData {
            id: 1,
            name: "Test User".to_string(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            password: "hash".to_string(),
            is_banned: false,
            is_sys_admin: false,
            club_admin_status: ClubAdminStatus::NeverApplied,
            is_verified: true,
            verification_token: None,
            verification_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn banned_users_are_denied_regardless_of_role() {
        let mut banned = user();
        banned.is_banned = true;

        assert_eq!(authorize(&banned, ANY_ROLE), Err(AccessError::Banned));

        banned.is_sys_admin = true;
        assert_eq!(
            authorize(&banned, &[Role::SysAdmin]),
            Err(AccessError::Banned)
        );
    }

    #[test]
    fn unverified_users_are_denied() {
        let mut unverified = user();
        unverified.is_verified = false;

        assert_eq!(
            authorize(&unverified, ANY_ROLE),
            Err(AccessError::Unverified)
        );
    }

    #[test]
    fn unresolved_applicants_are_denied_with_their_standing() {
        let mut pending = user();
        pending.club_admin_status = ClubAdminStatus::Pending;

        assert_eq!(
            authorize(&pending, ANY_ROLE),
            Err(AccessError::ApplicationPending)
        );
        assert_eq!(
            authorize(&pending, &[Role::Student]),
            Err(AccessError::ApplicationPending)
        );

        let mut rejected = user();
        rejected.club_admin_status = ClubAdminStatus::Rejected;

        assert_eq!(
            authorize(&rejected, ANY_ROLE),
            Err(AccessError::ApplicationRejected)
        );
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        assert_eq!(
            authorize(&user(), &[Role::ClubAdmin]),
            Err(AccessError::Forbidden)
        );
        assert_eq!(
            authorize(&user(), &[Role::ClubAdmin, Role::SysAdmin]),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn matching_role_is_allowed() {
        assert_eq!(authorize(&user(), &[Role::Student]), Ok(Role::Student));
        assert_eq!(authorize(&user(), ANY_ROLE), Ok(Role::Student));

        let mut admin = user();
        admin.is_sys_admin = true;
        assert_eq!(authorize(&admin, &[Role::SysAdmin]), Ok(Role::SysAdmin));
    }
}
