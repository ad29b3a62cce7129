use crate::cli::CliAuthTokenKey;
use crate::data_store::{StoreError, UserId};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub struct EnumMemberNotExistingError {
    pub member_value: i32,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for the {} enum",
            self.member_value, self.enum_name
        )
    }
}

impl std::error::Error for EnumMemberNotExistingError {}

/// Authorization token representing an authenticated user towards the data_store.
///
/// The AuthToken carries the user's id and access role. It is our main protection against
/// accidental unauthorized-access bugs: every data_store access function requires an AuthToken and
/// checks it for the required privilege. An AuthToken can only be created by
/// [crate::data_store::BookingStoreFacade::get_auth_token_for_session], based on a verified
/// session token.
///
/// For actions that are not bound to a web client (CLI maintenance), a [GlobalAuthToken] is
/// required instead.
pub struct AuthToken {
    user_id: UserId,
    role: AccessRole,
}

impl AuthToken {
    /// Create a new AuthToken for a client session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::BookingStoreFacade::get_auth_token_for_session] after verifying the
    /// session token's signature and resolving the user's stored role.
    pub(super) fn create_for_session(user_id: UserId, role: AccessRole) -> Self {
        AuthToken { user_id, role }
    }

    /// The id of the authenticated user. Used for ownership checks on bookings.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Check if the AuthToken authorizes for the given `privilege`.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles].
    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege.qualifying_roles().contains(&self.role)
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege.clone()) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }
}

/// Authorization token for data_store actions that are not performed on behalf of a web client.
///
/// A GlobalAuthToken can only be created by cli functions via [GlobalAuthToken::create_for_cli].
pub struct GlobalAuthToken {
    roles: Vec<AccessRole>,
}

impl GlobalAuthToken {
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        GlobalAuthToken {
            roles: vec![AccessRole::Staff],
        }
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
    }

    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege.clone()) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }
}

/// Possible access roles of a user account.
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug)]
#[repr(i32)]
pub enum AccessRole {
    Student = 1,
    Staff = 2,
}

impl TryFrom<i32> for AccessRole {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AccessRole::Student),
            2 => Ok(AccessRole::Staff),
            value => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "AccessRole",
            }),
        }
    }
}

impl From<AccessRole> for i32 {
    fn from(value: AccessRole) -> Self {
        value as i32
    }
}

impl From<AccessRole> for roombook_api_types::Role {
    fn from(value: AccessRole) -> Self {
        match value {
            AccessRole::Student => roombook_api_types::Role::Student,
            AccessRole::Staff => roombook_api_types::Role::Staff,
        }
    }
}

impl From<roombook_api_types::Role> for AccessRole {
    fn from(value: roombook_api_types::Role) -> Self {
        match value {
            roombook_api_types::Role::Student => AccessRole::Student,
            roombook_api_types::Role::Staff => AccessRole::Staff,
        }
    }
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::Student => "Student",
            AccessRole::Staff => "Staff",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone)]
pub enum Privilege {
    ViewRooms,
    CreateBookings,
    ManageOwnBookings,
    ReviewBookings,
    ManageRooms,
    ManageUsers,
}

impl Privilege {
    /// Get the list of [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::ViewRooms => &[AccessRole::Student, AccessRole::Staff],
            Privilege::CreateBookings => &[AccessRole::Student, AccessRole::Staff],
            Privilege::ManageOwnBookings => &[AccessRole::Student, AccessRole::Staff],
            Privilege::ReviewBookings => &[AccessRole::Staff],
            Privilege::ManageRooms => &[AccessRole::Staff],
            Privilege::ManageUsers => &[AccessRole::Staff],
        }
    }
}
