/// Method namespaces of the Snapcast control protocol
///
/// A JSON-RPC method name is `{namespace}.{action}`, e.g. `Group.SetStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Server-wide queries (`Server.GetStatus`)
    Server,

    /// Group membership, stream assignment and naming
    Group,

    /// Per-client settings
    Client,
}

impl Service {
    /// Get the namespace as it appears in method names
    pub fn name(&self) -> &'static str {
        match self {
            Service::Server => "Server",
            Service::Group => "Group",
            Service::Client => "Client",
        }
    }

    /// Build the full method name for an action in this namespace
    pub fn method(&self, action: &str) -> String {
        format!("{}.{}", self.name(), action)
    }
}
