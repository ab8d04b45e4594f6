use crate::escalation::OffenderIdentity;

/// Admin recipient set and duty roster, resolved from configuration at
/// startup. The dispatcher fans alerts out to `recipients()`; the
/// escalation service consults it before striking anyone.
#[derive(Clone, Debug, Default)]
pub struct AdminDirectory {
    admins: Vec<String>,
    duty_roster: Vec<String>,
}

impl AdminDirectory {
    pub fn new(admins: Vec<String>, duty_roster: Vec<String>) -> Self {
        Self { admins, duty_roster }
    }

    pub fn recipients(&self) -> &[String] {
        &self.admins
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.iter().any(|admin| admin == user_id)
    }

    pub fn holds_duty_role(&self, user_id: &str) -> bool {
        self.duty_roster.iter().any(|holder| holder == user_id)
    }

    pub fn identify(&self, user_id: &str) -> OffenderIdentity {
        OffenderIdentity {
            user_id: user_id.to_string(),
            is_admin: self.is_admin(user_id),
            holds_duty_role: self.holds_duty_role(user_id),
        }
    }
}
