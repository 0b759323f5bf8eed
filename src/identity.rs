/// Signed-in state of the current member, as far as this client cares.
pub trait Identity {
    fn is_authenticated(&self) -> bool;

    fn member_name(&self) -> Option<&str>;
}

/// Identity taken from local configuration: a configured, non-blank
/// member name counts as signed in.
#[derive(Debug, Clone, Default)]
pub struct MemberIdentity {
    name: Option<String>,
}

impl MemberIdentity {
    pub fn new(name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self { name }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl Identity for MemberIdentity {
    fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    fn member_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
