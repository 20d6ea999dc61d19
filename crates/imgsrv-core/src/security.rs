//! Principals and authority tokens used for row-level access control

use std::collections::BTreeSet;

/// Authority tokens consulted by the data layer
pub mod tokens {
    /// Holder sees every study regardless of data-access grants
    pub const DATA_ACCESS_ALL_STUDIES: &str = "Data Access/Access to all studies";
    /// Holder sees every partition regardless of data-access grants
    pub const DATA_ACCESS_ALL_PARTITIONS: &str = "Data Access/Access to all partitions";
}

/// The user on whose behalf queries run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_name: String,
    tokens: BTreeSet<String>,
    authority_groups: BTreeSet<String>,
}

impl Principal {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            tokens: BTreeSet::new(),
            authority_groups: BTreeSet::new(),
        }
    }

    /// Administrative principal holding every data-access token
    pub fn system() -> Self {
        Self::new("system")
            .with_token(tokens::DATA_ACCESS_ALL_STUDIES)
            .with_token(tokens::DATA_ACCESS_ALL_PARTITIONS)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens.insert(token.into());
        self
    }

    /// Add membership of the authority group with this OID
    pub fn with_authority_group(mut self, oid: impl Into<String>) -> Self {
        self.authority_groups.insert(oid.into());
        self
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn is_in_role(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn can_access_all_studies(&self) -> bool {
        self.is_in_role(tokens::DATA_ACCESS_ALL_STUDIES)
    }

    pub fn can_access_all_partitions(&self) -> bool {
        self.is_in_role(tokens::DATA_ACCESS_ALL_PARTITIONS)
    }

    /// Authority group OIDs, sorted
    pub fn authority_groups(&self) -> impl Iterator<Item = &str> + '_ {
        self.authority_groups.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_principal_is_unrestricted() {
        let system = Principal::system();
        assert!(system.can_access_all_studies());
        assert!(system.can_access_all_partitions());
    }

    #[test]
    fn test_plain_principal_is_restricted() {
        let user = Principal::new("radiologist").with_authority_group("oid-b").with_authority_group("oid-a");
        assert!(!user.can_access_all_studies());
        let groups: Vec<_> = user.authority_groups().collect();
        assert_eq!(groups, vec!["oid-a", "oid-b"]);
    }
}
