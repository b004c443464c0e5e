//! Role-based access in one table: every (resource, action) pair maps to a
//! rule, and handlers ask `authorize` before touching the store.

use tracing::warn;
use uuid::Uuid;

use memeplayers_types::models::Role;

use crate::error::ApiError;
use crate::middleware::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Coins,
    Votes,
    Communities,
    Posts,
    Comments,
    Notes,
    Ratings,
    Badges,
    UserBadges,
    Notifications,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Any authenticated user. Notes and notifications are additionally
    /// scoped to their owner by the store.
    Authenticated,
    AdminOnly,
    ModeratorOrAdmin,
    /// The record's owner, or an admin. Needs the owner id.
    OwnerOrAdmin,
}

pub fn rule_for(resource: Resource, action: Action) -> Rule {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Users | Badges | UserBadges | Analytics, _) => Rule::AdminOnly,
        (Communities, Update | Delete) => Rule::ModeratorOrAdmin,
        (Coins | Posts | Comments | Ratings | Votes, Update | Delete) => Rule::OwnerOrAdmin,
        _ => Rule::Authenticated,
    }
}

fn permits(rule: Rule, actor: &Actor, owner: Option<Uuid>) -> bool {
    match rule {
        Rule::Authenticated => true,
        Rule::AdminOnly => actor.role == Role::Admin,
        Rule::ModeratorOrAdmin => matches!(actor.role, Role::Admin | Role::Moderator),
        Rule::OwnerOrAdmin => actor.role == Role::Admin || owner == Some(actor.id),
    }
}

/// Check `actor` against the rule for (resource, action). `owner` is the
/// owning user of the record being acted on, when there is one.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    action: Action,
    owner: Option<Uuid>,
) -> Result<(), ApiError> {
    let rule = rule_for(resource, action);
    if permits(rule, actor, owner) {
        return Ok(());
    }

    warn!(
        "Denied {:?} on {:?} for {} ({})",
        action, resource, actor.username, actor.role
    );
    Err(ApiError::Forbidden(
        "you do not have permission to perform this action".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: format!("{}-actor", role),
            role,
        }
    }

    #[test]
    fn admin_only_resources() {
        let user = actor(Role::User);
        let moderator = actor(Role::Moderator);
        let admin = actor(Role::Admin);

        for resource in [Resource::Users, Resource::Badges, Resource::UserBadges, Resource::Analytics] {
            for action in [Action::List, Action::Retrieve, Action::Create, Action::Update, Action::Delete] {
                assert!(authorize(&user, resource, action, None).is_err());
                assert!(authorize(&moderator, resource, action, None).is_err());
                assert!(authorize(&admin, resource, action, None).is_ok());
            }
        }
    }

    #[test]
    fn owner_or_admin_writes() {
        let owner = actor(Role::User);
        let other = actor(Role::User);
        let moderator = actor(Role::Moderator);
        let admin = actor(Role::Admin);

        for resource in [Resource::Coins, Resource::Posts, Resource::Comments, Resource::Ratings, Resource::Votes] {
            for action in [Action::Update, Action::Delete] {
                assert!(authorize(&owner, resource, action, Some(owner.id)).is_ok());
                assert!(authorize(&other, resource, action, Some(owner.id)).is_err());
                assert!(authorize(&moderator, resource, action, Some(owner.id)).is_err());
                assert!(authorize(&admin, resource, action, Some(owner.id)).is_ok());
            }
            assert!(authorize(&other, resource, Action::Create, None).is_ok());
            assert!(authorize(&other, resource, Action::Retrieve, Some(owner.id)).is_ok());
        }
    }

    #[test]
    fn communities_moderated() {
        let user = actor(Role::User);
        assert!(authorize(&user, Resource::Communities, Action::Create, None).is_ok());
        assert!(authorize(&user, Resource::Communities, Action::Update, Some(user.id)).is_err());
        assert!(authorize(&actor(Role::Moderator), Resource::Communities, Action::Delete, None).is_ok());
        assert_eq!(rule_for(Resource::Notes, Action::Delete), Rule::Authenticated);
        assert_eq!(rule_for(Resource::Notifications, Action::Update), Rule::Authenticated);
    }
}
