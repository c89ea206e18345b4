//! User roles.

string_enum! {
    /// Role assigned at user creation. Immutable in normal flow.
    pub enum Role {
        Client => "client",
        Admin => "admin",
    }
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}
