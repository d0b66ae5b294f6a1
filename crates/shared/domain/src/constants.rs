//! Names shared between the persistence configuration and the slices it wires.

/// Reference name of the actor provider backed by the security context.
pub const SECURITY_AUDITOR: &str = "security_auditor";

/// Actor recorded when no user is bound to the current task.
pub const SYSTEM_ACTOR: &str = "system";
/// Login of an unauthenticated caller.
pub const ANONYMOUS_ACTOR: &str = "anonymoususer";

pub const EMPLOYEE: &str = "employee";
