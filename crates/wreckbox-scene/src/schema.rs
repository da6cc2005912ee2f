//! serde model of the persisted scene document.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Top-level scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    /// World gravity along Y (usually negative).
    pub gravity_y: f32,
    /// Whether the host renders with textures; carried through untouched.
    pub textures_enabled: bool,
    /// Spawn records, applied in order.
    pub entities: Vec<SceneRecord>,
}

/// One persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    /// Spawn-definition tag; unknown tags skip the record with a warning.
    pub template_id: String,
    /// World position.
    pub position: Vec3Record,
    /// Orientation quaternion.
    pub rotation: QuatRecord,
    /// Per-axis scale.
    pub scale: Vec3Record,
    /// Optional physics-property overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<PropsRecord>,
}

/// Plain 3-vector as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Plain quaternion as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Persisted physics-property overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropsRecord {
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
}

/// Fallback spawn position for records with non-finite positions.
pub const FALLBACK_POSITION: Vec3 = Vec3::new(0.0, 5.0, 0.0);

impl SceneRecord {
    /// A record at the origin with identity pose; test and tooling helper.
    pub fn at_origin(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            position: Vec3Record {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            rotation: QuatRecord {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 1.0,
            },
            scale: Vec3Record {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
            props: None,
        }
    }

    /// Sanitized `(position, rotation, scale)` for spawning: non-finite
    /// numeric fields fall back to safe defaults (position `(0, 5, 0)`,
    /// identity rotation, unit scale) so one bad record never aborts a load.
    pub fn sanitized_transform(&self) -> (Vec3, Quat, Vec3) {
        let position = Vec3::new(self.position.x, self.position.y, self.position.z);
        let position = if position.is_finite() {
            position
        } else {
            FALLBACK_POSITION
        };

        let rotation = Quat::from_xyzw(
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.rotation.w,
        );
        let rotation = if rotation.is_finite() && rotation.length_squared() > 1e-6 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };

        let scale = Vec3::new(self.scale.x, self.scale.y, self.scale.z);
        let scale = if scale.is_finite() && scale.min_element() > 0.0 {
            scale
        } else {
            Vec3::ONE
        };

        (position, rotation, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_record_passes_through() {
        let mut record = SceneRecord::at_origin("crate");
        record.position = Vec3Record {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        let (p, r, s) = record.sanitized_transform();
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(r, Quat::IDENTITY);
        assert_eq!(s, Vec3::ONE);
    }

    #[test]
    fn test_nan_position_falls_back() {
        let mut record = SceneRecord::at_origin("crate");
        record.position.y = f32::NAN;
        let (p, _, _) = record.sanitized_transform();
        assert_eq!(p, FALLBACK_POSITION);
    }

    #[test]
    fn test_degenerate_rotation_falls_back_to_identity() {
        let mut record = SceneRecord::at_origin("crate");
        record.rotation = QuatRecord {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        };
        let (_, r, _) = record.sanitized_transform();
        assert_eq!(r, Quat::IDENTITY);
    }

    #[test]
    fn test_unnormalized_rotation_is_normalized() {
        let mut record = SceneRecord::at_origin("crate");
        record.rotation = QuatRecord {
            x: 0.0,
            y: 2.0,
            z: 0.0,
            w: 0.0,
        };
        let (_, r, _) = record.sanitized_transform();
        assert!((r.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_scale_falls_back() {
        let mut record = SceneRecord::at_origin("crate");
        record.scale = Vec3Record {
            x: -1.0,
            y: 1.0,
            z: 1.0,
        };
        let (_, _, s) = record.sanitized_transform();
        assert_eq!(s, Vec3::ONE);
    }
}
