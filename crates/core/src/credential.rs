//! Credential kinds.

string_enum! {
    pub enum CredentialType {
        Login => "login",
        ApiKey => "api_key",
        SshKey => "ssh_key",
        Database => "database",
        Ftp => "ftp",
        Other => "other",
    }
}
