//! Model descriptors of the organization's entities.

use std::sync::Arc;

use chrono::Utc;
use roster_core::{
    Attributes, CredentialHasher, DomainError, ModelDescriptor, ModelId, Relation, SaveKind,
    Schema, SchemaBuilder, SchemaError, Value,
};

use crate::api::validate::parse_datetime;

/// Stored form of every timestamp: UTC, second precision.
///
/// Text comparison of two values in this form orders them chronologically,
/// which the `startMin`/`startMax` filters rely on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handles of every model in the schema built by [`build`].
#[derive(Debug, Clone, Copy)]
pub struct Models {
    pub role: ModelId,
    pub user: ModelId,
    pub event_type: ModelId,
    pub event: ModelId,
    pub attendance_record: ModelId,
    pub announcement: ModelId,
}

/// Membership roles, seeded with fixed identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    #[default]
    Initiate = 1,
    Pending = 2,
    Inactive = 3,
    Member = 4,
    Officer = 5,
    Admin = 6,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Initiate,
        Role::Pending,
        Role::Inactive,
        Role::Member,
        Role::Officer,
        Role::Admin,
    ];

    #[inline]
    pub const fn id(self) -> i64 {
        self as i64
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Role::Initiate => "initiate",
            Role::Pending => "pending",
            Role::Inactive => "inactive",
            Role::Member => "member",
            Role::Officer => "officer",
            Role::Admin => "admin",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Role::Initiate => "Initiate",
            Role::Pending => "Pending Member",
            Role::Inactive => "Inactive Member",
            Role::Member => "Member",
            Role::Officer => "Officer",
            Role::Admin => "Administrator",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Role::Initiate => "Prospective members in the process of initiation.",
            Role::Pending => "In the process of being approved to be a member.",
            Role::Inactive => "Inactive member.",
            Role::Member => "Active member.",
            Role::Officer => "A current officer on the officer board.",
            Role::Admin => "Administrator in charge of handling the web application.",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.name() == name)
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

/// Declares every model, then wires their relations.
pub fn build(hasher: Arc<dyn CredentialHasher>) -> Result<(Schema, Models), SchemaError> {
    let mut schema = SchemaBuilder::new();

    let role = schema.declare(
        ModelDescriptor::new("Role", "roles")
            .fillable(["name", "display_name", "description"])
            .queryable(["name"]),
    )?;

    let user = schema.declare(
        ModelDescriptor::new("User", "users")
            .hidden(["password", "pid", "is_admin"])
            .guarded(["id", "is_admin", "valid", "role_id"])
            .queryable(["first_name", "last_name", "house", "role_id", "email"])
            .transform(move |attrs, _| hash_password(hasher.as_ref(), attrs))
            .transform(|attrs, _| resolve_role(attrs)),
    )?;

    let event_type = schema.declare(
        ModelDescriptor::new("Event type", "event_types")
            .fillable(["name", "display_name", "description"])
            .queryable(["name"]),
    )?;

    let event = schema.declare(
        ModelDescriptor::new("Event", "events")
            .fillable([
                "summary",
                "description",
                "points",
                "location",
                "start",
                "end",
                "type_id",
                "officer_id",
            ])
            .queryable([
                "summary",
                "points",
                "location",
                "start",
                "end",
                "type_id",
                "officer_id",
            ])
            .transform(|attrs, _| canonical_times(attrs))
            .transform(touch),
    )?;

    let attendance_record = schema.declare(
        ModelDescriptor::new("Attendance record", "attendance_records")
            .hidden(["user_id", "event_id"])
            .fillable(["points_earned"])
            .queryable(["user_id", "event_id", "points_earned"]),
    )?;

    let announcement = schema.declare(
        ModelDescriptor::new("Announcement", "announcements")
            .fillable(["summary", "description"])
            .queryable(["summary"])
            .transform(touch),
    )?;

    schema.relate(role, "users", Relation::has_many(user, "role_id"))?;

    schema.relate(user, "role", Relation::belongs_to(role, "role_id"))?;
    schema.relate(
        user,
        "events",
        Relation::many_to_many(event, "attendance_records", "user_id", "event_id"),
    )?;
    schema.relate(user, "records", Relation::has_many(attendance_record, "user_id"))?;

    schema.relate(event_type, "events", Relation::has_many(event, "type_id"))?;

    schema.relate(
        event,
        "users",
        Relation::many_to_many(user, "attendance_records", "event_id", "user_id"),
    )?;
    schema.relate(event, "type", Relation::belongs_to(event_type, "type_id"))?;
    schema.relate(event, "officer", Relation::belongs_to(user, "officer_id"))?;
    schema.relate(event, "records", Relation::has_many(attendance_record, "event_id"))?;

    schema.relate(attendance_record, "user", Relation::belongs_to(user, "user_id"))?;
    schema.relate(attendance_record, "event", Relation::belongs_to(event, "event_id"))?;

    let models = Models {
        role,
        user,
        event_type,
        event,
        attendance_record,
        announcement,
    };
    Ok((schema.finish(), models))
}

// ============================================================================
// Pre-save transforms
// ============================================================================

/// Replaces a plaintext `password` with its digest.
fn hash_password(hasher: &dyn CredentialHasher, attrs: &mut Attributes) -> Result<(), DomainError> {
    let Some(password) = attrs.get("password") else {
        return Ok(());
    };
    let Some(plain) = password.as_str() else {
        return Err(DomainError::malformed("Password must be a string."));
    };
    let digest = hasher.hash(plain)?;
    attrs.insert("password".into(), digest.into());
    Ok(())
}

/// Converts a `role` name into `role_id`.
fn resolve_role(attrs: &mut Attributes) -> Result<(), DomainError> {
    let Some(name) = attrs.remove("role") else {
        return Ok(());
    };
    let role = name
        .as_str()
        .and_then(Role::from_name)
        .ok_or_else(|| DomainError::malformed(format!("`{name}` is not a role.")))?;
    attrs.insert("role_id".into(), role.id().into());
    Ok(())
}

/// Any accepted datetime, rewritten in [`TIMESTAMP_FORMAT`].
pub fn canonical_datetime(value: &str) -> Option<String> {
    parse_datetime(value).map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Stores event `start`/`end` in [`TIMESTAMP_FORMAT`].
fn canonical_times(attrs: &mut Attributes) -> Result<(), DomainError> {
    for key in ["start", "end"] {
        let Some(value) = attrs.get_mut(key) else {
            continue;
        };
        let canonical = value
            .as_str()
            .and_then(canonical_datetime)
            .ok_or_else(|| DomainError::malformed(format!("`{key}` must be a valid date.")))?;
        *value = Value::Text(canonical);
    }
    Ok(())
}

/// Stamps `updated_at` on updates.
fn touch(attrs: &mut Attributes, kind: SaveKind) -> Result<(), DomainError> {
    if kind == SaveKind::Update {
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        attrs.insert("updated_at".into(), Value::Text(now));
    }
    Ok(())
}
