use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

/// Fixed role ladder. Declared in ascending order so `Ord` compares by
/// privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    User,
    Moderator,
    Admin,
    Owner,
}

/// Service configuration, constructed once at startup and passed by
/// reference. Environment loading lives in the bootstrap shim; nothing in
/// the core reads ambient state.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Shared secret for capability-link signatures.
    pub secret: String,
    pub owner: String,
    pub admins: HashSet<String>,
    pub moderators: HashSet<String>,
    /// Empty list means allow all clients.
    pub ip_allowlist: Vec<IpAddr>,
    /// Max requests per `(client, route)` within one rate window.
    pub rate_limit_max: u32,
    pub rate_window: Duration,
    /// Capability tokens are accepted within this skew of `now`, in both
    /// directions.
    pub token_ttl: Duration,
    /// Declared request bodies above this are rejected before buffering.
    pub max_body_bytes: u64,
    /// Advisory lock around draw-like actions, guards double triggers.
    pub draw_lock_ttl: Duration,
    /// Tickets credited to a referrer per successful referral.
    pub referral_bonus: u32,
    /// Ceiling on one referrer's cumulative bonus tickets.
    pub referral_cap: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            owner: String::new(),
            admins: HashSet::new(),
            moderators: HashSet::new(),
            ip_allowlist: Vec::new(),
            rate_limit_max: 30,
            rate_window: Duration::from_secs(60),
            token_ttl: Duration::from_secs(10 * 60),
            max_body_bytes: 64 * 1024,
            draw_lock_ttl: Duration::from_secs(5),
            referral_bonus: 1,
            referral_cap: 5,
        }
    }
}

impl ServiceConfig {
    pub fn role_of(&self, user_id: &str) -> Role {
        if user_id == self.owner {
            Role::Owner
        } else if self.admins.contains(user_id) {
            Role::Admin
        } else if self.moderators.contains(user_id) {
            Role::Moderator
        } else {
            Role::User
        }
    }

    /// Whether the user may trigger privileged contest mutations.
    pub fn is_privileged(&self, user_id: &str) -> bool {
        self.role_of(user_id) >= Role::Moderator
    }
}
