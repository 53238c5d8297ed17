//! Tier Resolver (C7, §4.6).
//!
//! No close teacher analogue — the teacher has no role/tier concept — built
//! fresh following the precedence table in §4.6 and the Elite > Architect
//! resolution mandated by §9.

use crate::models::{Tier, TierInfo};

pub struct TierResolverConfig {
    pub owner_user_id: String,
    pub staff_role_id: Option<String>,
    pub elite_role_id: Option<String>,
    pub architect_role_id: Option<String>,
}

pub struct TierResolver {
    config: TierResolverConfig,
    partner_servers: dashmap::DashSet<String>,
}

impl TierResolver {
    pub fn new(config: TierResolverConfig) -> Self {
        Self {
            config,
            partner_servers: dashmap::DashSet::new(),
        }
    }

    pub fn mark_partner(&self, server_id: &str) {
        self.partner_servers.insert(server_id.to_string());
    }

    pub fn unmark_partner(&self, server_id: &str) {
        self.partner_servers.remove(server_id);
    }

    fn has_role(role_ids: &[String], target: &Option<String>) -> bool {
        match target {
            Some(target) => role_ids.iter().any(|r| r == target),
            None => false,
        }
    }

    /// Resolve a user's tier, checking roles across all servers the bot is in
    /// (`role_ids` is expected to already be the union across servers — the
    /// out-of-core gateway client is responsible for collecting it).
    pub fn resolve(&self, user_id: &str, role_ids: &[String], source_server_id: &str) -> TierInfo {
        if user_id == self.config.owner_user_id && !self.config.owner_user_id.is_empty() {
            return TierInfo { tier: Tier::Founder, priority: Tier::Founder.priority() };
        }

        let is_staff = Self::has_role(role_ids, &self.config.staff_role_id);
        let is_elite = Self::has_role(role_ids, &self.config.elite_role_id);
        let is_architect = Self::has_role(role_ids, &self.config.architect_role_id);

        if is_staff {
            let priority = if is_elite {
                Tier::Elite.priority()
            } else if is_architect {
                Tier::Architect.priority()
            } else {
                Tier::Staff.priority()
            };
            return TierInfo { tier: Tier::Staff, priority };
        }

        if is_elite {
            return TierInfo { tier: Tier::Elite, priority: Tier::Elite.priority() };
        }

        if is_architect {
            return TierInfo { tier: Tier::Architect, priority: Tier::Architect.priority() };
        }

        if self.partner_servers.contains(source_server_id) {
            return TierInfo { tier: Tier::Partner, priority: Tier::Partner.priority() };
        }

        TierInfo { tier: Tier::Standard, priority: Tier::Standard.priority() }
    }
}
