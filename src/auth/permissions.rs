//! Centralized role-based access rules.
//!
//! One static table maps (resource, operation) to either an explicit role
//! allow-list or a minimum rank in the management chain. The same table
//! drives both menu construction (hide what a role cannot do) and handler
//! gating (re-check before every backend call) - hiding is a convenience,
//! the handler check is the boundary.
//!
//! Reports are hard-denied for every role: financial exports are dashboard-only
//! by product decision, independent of anything in the table.

use crate::auth::role::Role;
use crate::error::{CoreError, Result};

/// Backend resources reachable through the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Student,
    Group,
    Payment,
    Attendance,
    Employee,
    Document,
    Report,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Student,
        Resource::Group,
        Resource::Payment,
        Resource::Attendance,
        Resource::Employee,
        Resource::Document,
        Resource::Report,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Export,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Export,
    ];
}

/// How a rule grants access.
#[derive(Debug, Clone, Copy)]
enum Access {
    /// Explicit allow-list. The only way incomparable roles gain access.
    Roles(&'static [Role]),
    /// Minimum rank within the management chain.
    AtLeast(Role),
}

/// Every authenticated role. Read-level access for most resources.
const ANY_ROLE: &[Role] = &[
    Role::Developer,
    Role::Director,
    Role::Administrator,
    Role::Accountant,
    Role::Mentor,
    Role::SalesAgent,
    Role::Assistant,
];

/// Attendance is operational data: management plus the mentors who take it.
const ATTENDANCE_READERS: &[Role] = &[Role::Developer, Role::Administrator, Role::Mentor];

/// Static rule table, loaded once, never mutated at runtime. Changing it
/// requires a restart. Pairs not listed here are denied.
fn rule(resource: Resource, operation: Operation) -> Option<Access> {
    use Operation::*;
    use Resource::*;

    match (resource, operation) {
        (Student, Read) => Some(Access::Roles(ANY_ROLE)),
        (Student, Create | Update | Delete) => Some(Access::AtLeast(Role::Administrator)),

        (Group, Read) => Some(Access::Roles(ANY_ROLE)),
        (Group, Create | Update | Delete) => Some(Access::AtLeast(Role::Administrator)),

        (Payment, Read) => Some(Access::Roles(ANY_ROLE)),
        (Payment, Create) => Some(Access::Roles(ANY_ROLE)),

        (Attendance, Read) => Some(Access::Roles(ATTENDANCE_READERS)),
        (Attendance, Create) => Some(Access::AtLeast(Role::Administrator)),

        (Employee, Read) => Some(Access::Roles(ANY_ROLE)),
        (Employee, Create | Update | Delete) => Some(Access::AtLeast(Role::Administrator)),

        (Document, Read) => Some(Access::Roles(ANY_ROLE)),

        // Report rules intentionally absent - see is_allowed
        _ => None,
    }
}

/// Pure (role, resource, operation) -> allowed decision.
pub fn is_allowed(role: Role, resource: Resource, operation: Operation) -> bool {
    // Financial exports never go through the bot, regardless of configuration
    if resource == Resource::Report {
        return false;
    }

    match rule(resource, operation) {
        Some(Access::Roles(roles)) => roles.contains(&role),
        Some(Access::AtLeast(threshold)) => role.at_least(threshold),
        None => false,
    }
}

/// Gate form of [`is_allowed`] for use inside handlers.
pub fn ensure_allowed(role: Role, resource: Resource, operation: Operation) -> Result<()> {
    if is_allowed(role, resource, operation) {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

/// Target-aware rule for employee management: who may modify whom.
///
/// Developer touches everyone; Director everyone except Developer;
/// Administrator only roles strictly below Administrator.
pub fn can_manage_employee(actor: Role, target: Role) -> bool {
    match actor {
        Role::Developer => true,
        Role::Director => target != Role::Developer,
        Role::Administrator => match target.rank() {
            Some(rank) => rank < Role::Administrator.rank().unwrap_or(u8::MAX),
            // Leaf roles sit below the whole chain
            None => true,
        },
        _ => false,
    }
}

/// Roles the actor may assign when creating or editing an employee.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|target| can_manage_employee(actor, *target))
        .collect()
}
