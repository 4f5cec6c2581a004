//! Participant registry: the authoritative set of known actors and their
//! roles. Mutations are restricted to the administrative principal fixed
//! at construction time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use core_types::{ErrorKind, PrincipalId, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("participant identity must not be empty")]
    EmptyIdentity,
    #[error("participant name must not be empty")]
    EmptyName,
    #[error("caller {caller} is not the registry administrator")]
    NotAdmin { caller: PrincipalId },
    #[error("identity {id} is already registered and active")]
    AlreadyRegistered { id: PrincipalId },
    #[error("unknown participant {id}")]
    UnknownParticipant { id: PrincipalId },
    #[error("participant {id} is not active")]
    NotActive { id: PrincipalId },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::EmptyIdentity | RegistryError::EmptyName => ErrorKind::Validation,
            RegistryError::NotAdmin { .. } => ErrorKind::Authorization,
            RegistryError::AlreadyRegistered { .. } => ErrorKind::Conflict,
            RegistryError::UnknownParticipant { .. } => ErrorKind::NotFound,
            RegistryError::NotActive { .. } => ErrorKind::State,
        }
    }
}

/// A registered actor. Records are never deleted; deactivation flips the
/// `active` flag and leaves the record readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: PrincipalId,
    pub role: Role,
    pub name: String,
    pub location: String,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

/// Keyed store of participants plus the admin principal allowed to
/// mutate it.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    admin: PrincipalId,
    participants: HashMap<PrincipalId, Participant>,
}

impl ParticipantRegistry {
    pub fn new(admin: PrincipalId) -> Self {
        Self {
            admin,
            participants: HashMap::new(),
        }
    }

    pub fn admin(&self) -> &PrincipalId {
        &self.admin
    }

    /// Registers a new participant. An identity whose previous record was
    /// deactivated may be registered again; the conflict check applies to
    /// active records only.
    pub fn register(
        &mut self,
        caller: &PrincipalId,
        id: PrincipalId,
        role: Role,
        name: String,
        location: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_admin(caller)?;
        if id.is_empty() {
            return Err(RegistryError::EmptyIdentity);
        }
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.is_active(&id) {
            return Err(RegistryError::AlreadyRegistered { id });
        }

        self.participants.insert(
            id.clone(),
            Participant {
                id,
                role,
                name,
                location,
                active: true,
                registered_at: now,
            },
        );
        Ok(())
    }

    /// Flips the active flag off. The role and record are retained but the
    /// participant can no longer act or receive custody.
    pub fn deactivate(&mut self, caller: &PrincipalId, id: &PrincipalId) -> Result<()> {
        self.require_admin(caller)?;
        let participant = self
            .participants
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownParticipant { id: id.clone() })?;
        if !participant.active {
            return Err(RegistryError::NotActive { id: id.clone() });
        }
        participant.active = false;
        Ok(())
    }

    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.participants.get(id).map_or(false, |p| p.active)
    }

    /// True when the participant is active and holds the given role.
    pub fn has_active_role(&self, id: &PrincipalId, role: Role) -> bool {
        self.participants
            .get(id)
            .map_or(false, |p| p.active && p.role == role)
    }

    pub fn get(&self, id: &PrincipalId) -> Result<&Participant> {
        self.participants
            .get(id)
            .ok_or_else(|| RegistryError::UnknownParticipant { id: id.clone() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    fn require_admin(&self, caller: &PrincipalId) -> Result<()> {
        if caller != &self.admin {
            return Err(RegistryError::NotAdmin {
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> PrincipalId {
        "admin".to_string()
    }

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::new(admin())
    }

    fn register_ok(reg: &mut ParticipantRegistry, id: &str, role: Role) {
        reg.register(
            &admin(),
            id.to_string(),
            role,
            format!("{id} inc"),
            "site".to_string(),
            Utc::now(),
        )
        .unwrap();
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = registry();
        register_ok(&mut reg, "p1", Role::Producer);

        assert!(reg.is_active(&"p1".to_string()));
        let p = reg.get(&"p1".to_string()).unwrap();
        assert_eq!(p.role, Role::Producer);
        assert_eq!(p.name, "p1 inc");
    }

    #[test]
    fn register_rejects_bad_input() {
        let mut reg = registry();
        let err = reg
            .register(
                &admin(),
                String::new(),
                Role::Producer,
                "x".into(),
                "y".into(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyIdentity));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = reg
            .register(
                &admin(),
                "p1".into(),
                Role::Producer,
                String::new(),
                "y".into(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }

    #[test]
    fn duplicate_active_registration_conflicts() {
        let mut reg = registry();
        register_ok(&mut reg, "p1", Role::Producer);
        let err = reg
            .register(
                &admin(),
                "p1".into(),
                Role::Receiver,
                "other".into(),
                "site".into(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn deactivated_identity_can_be_registered_fresh() {
        let mut reg = registry();
        register_ok(&mut reg, "p1", Role::Producer);
        reg.deactivate(&admin(), &"p1".to_string()).unwrap();
        assert!(!reg.is_active(&"p1".to_string()));

        register_ok(&mut reg, "p1", Role::Receiver);
        assert!(reg.is_active(&"p1".to_string()));
        assert_eq!(reg.get(&"p1".to_string()).unwrap().role, Role::Receiver);
    }

    #[test]
    fn deactivate_twice_is_a_state_error() {
        let mut reg = registry();
        register_ok(&mut reg, "p1", Role::Producer);
        reg.deactivate(&admin(), &"p1".to_string()).unwrap();
        let err = reg.deactivate(&admin(), &"p1".to_string()).unwrap_err();
        assert!(matches!(err, RegistryError::NotActive { .. }));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn non_admin_cannot_mutate() {
        let mut reg = registry();
        let err = reg
            .register(
                &"mallory".to_string(),
                "p1".into(),
                Role::Producer,
                "x".into(),
                "y".into(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotAdmin { .. }));
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = reg
            .deactivate(&"mallory".to_string(), &"p1".to_string())
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotAdmin { .. }));
    }

    #[test]
    fn overseer_role_check() {
        let mut reg = registry();
        register_ok(&mut reg, "q", Role::Overseer);
        register_ok(&mut reg, "p", Role::Producer);
        assert!(reg.has_active_role(&"q".to_string(), Role::Overseer));
        assert!(!reg.has_active_role(&"p".to_string(), Role::Overseer));

        reg.deactivate(&admin(), &"q".to_string()).unwrap();
        assert!(!reg.has_active_role(&"q".to_string(), Role::Overseer));
    }
}
