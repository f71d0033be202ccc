//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use volunteer_match::core::{
    Actor, Engine, EngineOptions, NewOpportunity, Opportunity, Organization, RepeatPolicy,
};
use volunteer_match::infra::{InMemoryNotificationStore, MemoryStore};
use volunteer_match::util::ids::{OrganizationId, UserId};

pub type TestEngine = Engine<MemoryStore, InMemoryNotificationStore>;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub engine: Arc<TestEngine>,
    pub organization: Organization,
    pub staff: Actor,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_repeat(repeat: RepeatPolicy) -> Self {
        Self::with_options(EngineOptions {
            repeat,
            ..EngineOptions::default()
        })
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let staff_user = UserId::new();
        let organization = Organization {
            id: OrganizationId::new(),
            name: "Harbour Helpers".into(),
            staff: vec![staff_user],
        };
        store.put_organization(organization.clone());
        let engine = Arc::new(Engine::new(
            Arc::clone(&store),
            Arc::clone(&notifications),
            options,
        ));
        Self {
            store,
            notifications,
            engine,
            staff: Actor::staff(staff_user, organization.id),
            organization,
        }
    }

    /// Register a second staff member for the fixture organization.
    pub fn add_staff(&mut self) -> Actor {
        let user = UserId::new();
        self.organization.staff.push(user);
        self.store.put_organization(self.organization.clone());
        Actor::staff(user, self.organization.id)
    }

    pub async fn opportunity(&self, max_participants: u32) -> Opportunity {
        self.opportunity_titled("Beach cleanup", max_participants).await
    }

    pub async fn opportunity_titled(&self, title: &str, max_participants: u32) -> Opportunity {
        self.engine
            .create_opportunity(
                &self.staff,
                NewOpportunity {
                    title: title.into(),
                    description: "Collect litter along the shore".into(),
                    location: "Porto".into(),
                    category: "environment".into(),
                    max_participants,
                },
            )
            .await
            .expect("create opportunity")
    }

    pub async fn current(&self, opportunity: &Opportunity) -> Opportunity {
        self.engine
            .roster(opportunity.id)
            .await
            .expect("roster")
            .opportunity
    }
}

pub fn volunteer() -> Actor {
    Actor::volunteer(UserId::new())
}
