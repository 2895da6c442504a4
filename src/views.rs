use crate::models::UserRole;

/// Top-level screens reachable from the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Statement,
    Reports,
    Admin,
    DevConsole,
}

const STAFF_VIEWS: &[View] = &[View::Dashboard, View::Statement, View::Reports];
const ADMIN_VIEWS: &[View] = &[
    View::Dashboard,
    View::Statement,
    View::Reports,
    View::Admin,
    View::DevConsole,
];

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Home",
            View::Statement => "History",
            View::Reports => "Reports",
            View::Admin => "Admin",
            View::DevConsole => "Dev",
        }
    }

    pub fn available(role: UserRole) -> &'static [View] {
        match role {
            UserRole::Admin => ADMIN_VIEWS,
            UserRole::Staff => STAFF_VIEWS,
        }
    }

    fn position(self, role: UserRole) -> usize {
        View::available(role)
            .iter()
            .position(|v| *v == self)
            .unwrap_or(0)
    }

    /// Next tab for `role`, wrapping around.
    pub fn next(self, role: UserRole) -> View {
        let views = View::available(role);
        views[(self.position(role) + 1) % views.len()]
    }

    pub fn prev(self, role: UserRole) -> View {
        let views = View::available(role);
        views[(self.position(role) + views.len() - 1) % views.len()]
    }

    /// Tab by number key (0-based). Out of range or not permitted gives `None`.
    pub fn from_index(index: usize, role: UserRole) -> Option<View> {
        View::available(role).get(index).copied()
    }

    pub fn is_allowed(self, role: UserRole) -> bool {
        View::available(role).contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_sees_three_views() {
        assert_eq!(
            View::available(UserRole::Staff),
            &[View::Dashboard, View::Statement, View::Reports]
        );
        assert!(!View::Admin.is_allowed(UserRole::Staff));
        assert!(!View::DevConsole.is_allowed(UserRole::Staff));
    }

    #[test]
    fn test_admin_sees_all_five() {
        assert_eq!(View::available(UserRole::Admin).len(), 5);
        assert!(View::DevConsole.is_allowed(UserRole::Admin));
    }

    #[test]
    fn test_next_prev_wrap() {
        assert_eq!(View::Reports.next(UserRole::Staff), View::Dashboard);
        assert_eq!(View::Reports.next(UserRole::Admin), View::Admin);
        assert_eq!(View::Dashboard.prev(UserRole::Admin), View::DevConsole);
        assert_eq!(View::Dashboard.prev(UserRole::Staff), View::Reports);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(View::from_index(1, UserRole::Staff), Some(View::Statement));
        assert_eq!(View::from_index(3, UserRole::Staff), None);
        assert_eq!(View::from_index(4, UserRole::Admin), Some(View::DevConsole));
    }

    #[test]
    fn test_labels() {
        let labels: Vec<&str> = View::available(UserRole::Admin).iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["Home", "History", "Reports", "Admin", "Dev"]);
    }
}
