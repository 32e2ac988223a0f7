use std::fmt;

/// Represents a platform user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub global_name: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            global_name: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_global_name(mut self, name: impl Into<String>) -> Self {
        self.global_name = Some(name.into());
        self
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// Both mention forms the platform may render for this user.
    pub fn mentions(&self) -> [String; 2] {
        [format!("<@{}>", self.id), format!("<@!{}>", self.id)]
    }

    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.global_name {
            name.clone()
        } else if let Some(ref username) = self.username {
            username.clone()
        } else {
            self.id.clone()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_global_name() {
        let user = User::new("42").with_username("enc").with_global_name("Encore");
        assert_eq!(user.display_name(), "Encore");
        assert_eq!(User::new("42").with_username("enc").to_string(), "enc");
        assert_eq!(User::new("42").to_string(), "42");
    }

    #[test]
    fn mentions_cover_nickname_form() {
        let user = User::new("7");
        assert_eq!(user.mentions(), ["<@7>".to_string(), "<@!7>".to_string()]);
    }
}
