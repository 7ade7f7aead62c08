//! Building variant configuration tables.
//!
//! A variant is an immutable template: a pure function from (variant,
//! rotation) to footprint, slot layout, and processor configuration.
//! Mirrored variants flip the vertical slot directions of the base layout
//! while preserving positions; placement rotation is applied on top of
//! that. Variant availability is gated on the injected read-only unlock
//! state, which is never consulted during per-tick processing.

use crate::ejector::EjectorSlotSpec;
use crate::error::ConfigError;
use crate::geometry::{Direction, Footprint, Rotation, SlotGeometry, TilePos};
use crate::item::ItemKind;
use crate::processor::ProcessorType;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

/// Progression rewards that gate building and variant availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Reward {
    CutterAndTrash,
    CutterQuad,
    Mixer,
    Stacker,
}

/// Read-only unlock state injected into variant selection.
pub trait RewardGate {
    fn is_unlocked(&self, reward: Reward) -> bool;
}

/// A gate with everything unlocked. Handy for sandbox mode and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllUnlocked;

impl RewardGate for AllUnlocked {
    fn is_unlocked(&self, _reward: Reward) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Building kinds and variants
// ---------------------------------------------------------------------------

/// The processing building families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Cutter,
    Mixer,
    Stacker,
}

/// A concrete variant of a building family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingVariant {
    CutterDefault,
    CutterMirrored,
    CutterQuad,
    CutterQuadMirrored,
    MixerDefault,
    MixerMirrored,
    StackerDefault,
    StackerMirrored,
}

impl BuildingKind {
    pub fn name(self) -> &'static str {
        match self {
            BuildingKind::Cutter => "cutter",
            BuildingKind::Mixer => "mixer",
            BuildingKind::Stacker => "stacker",
        }
    }

    /// The reward that unlocks this building at all.
    pub fn required_reward(self) -> Reward {
        match self {
            BuildingKind::Cutter => Reward::CutterAndTrash,
            BuildingKind::Mixer => Reward::Mixer,
            BuildingKind::Stacker => Reward::Stacker,
        }
    }

    pub fn is_unlocked(self, gate: &impl RewardGate) -> bool {
        gate.is_unlocked(self.required_reward())
    }

    /// Resolve a variant tag for this building. Unknown tags are a fatal
    /// configuration error identifying the building and the bad tag.
    pub fn variant_from_tag(self, tag: &str) -> Result<BuildingVariant, ConfigError> {
        let variant = match (self, tag) {
            (BuildingKind::Cutter, "default") => Some(BuildingVariant::CutterDefault),
            (BuildingKind::Cutter, "mirrored") => Some(BuildingVariant::CutterMirrored),
            (BuildingKind::Cutter, "quad") => Some(BuildingVariant::CutterQuad),
            (BuildingKind::Cutter, "quad-mirrored") => Some(BuildingVariant::CutterQuadMirrored),
            (BuildingKind::Mixer, "default") => Some(BuildingVariant::MixerDefault),
            (BuildingKind::Mixer, "mirrored") => Some(BuildingVariant::MixerMirrored),
            (BuildingKind::Stacker, "default") => Some(BuildingVariant::StackerDefault),
            (BuildingKind::Stacker, "mirrored") => Some(BuildingVariant::StackerMirrored),
            _ => None,
        };
        variant.ok_or_else(|| ConfigError::UnknownVariant {
            building: self.name(),
            tag: tag.to_string(),
        })
    }

    /// Variants the player may currently select, in presentation order.
    pub fn available_variants(self, gate: &impl RewardGate) -> Vec<BuildingVariant> {
        match self {
            BuildingKind::Cutter => {
                let mut variants = vec![
                    BuildingVariant::CutterDefault,
                    BuildingVariant::CutterMirrored,
                ];
                if gate.is_unlocked(Reward::CutterQuad) {
                    variants.push(BuildingVariant::CutterQuad);
                    variants.push(BuildingVariant::CutterQuadMirrored);
                }
                variants
            }
            BuildingKind::Mixer => vec![
                BuildingVariant::MixerDefault,
                BuildingVariant::MixerMirrored,
            ],
            BuildingKind::Stacker => vec![
                BuildingVariant::StackerDefault,
                BuildingVariant::StackerMirrored,
            ],
        }
    }
}

impl BuildingVariant {
    pub fn kind(self) -> BuildingKind {
        match self {
            BuildingVariant::CutterDefault
            | BuildingVariant::CutterMirrored
            | BuildingVariant::CutterQuad
            | BuildingVariant::CutterQuadMirrored => BuildingKind::Cutter,
            BuildingVariant::MixerDefault | BuildingVariant::MixerMirrored => BuildingKind::Mixer,
            BuildingVariant::StackerDefault | BuildingVariant::StackerMirrored => {
                BuildingKind::Stacker
            }
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            BuildingVariant::CutterDefault
            | BuildingVariant::MixerDefault
            | BuildingVariant::StackerDefault => "default",
            BuildingVariant::CutterMirrored
            | BuildingVariant::MixerMirrored
            | BuildingVariant::StackerMirrored => "mirrored",
            BuildingVariant::CutterQuad => "quad",
            BuildingVariant::CutterQuadMirrored => "quad-mirrored",
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            BuildingVariant::CutterMirrored
                | BuildingVariant::CutterQuadMirrored
                | BuildingVariant::MixerMirrored
                | BuildingVariant::StackerMirrored
        )
    }

    /// Membership in the quad family, tested explicitly against both the
    /// plain and mirrored quad variants.
    pub fn is_quad(self) -> bool {
        matches!(
            self,
            BuildingVariant::CutterQuad | BuildingVariant::CutterQuadMirrored
        )
    }

    /// Footprint as a pure function of the variant.
    pub fn footprint(self) -> Footprint {
        if self.is_quad() {
            Footprint::new(4, 1)
        } else {
            Footprint::new(2, 1)
        }
    }

    /// Derive the full slot and processor configuration for this variant at
    /// the given placement rotation.
    pub fn spec(self, rotation: Rotation) -> Result<VariantSpec, ConfigError> {
        let base = self.base_spec()?;
        let spec = if self.is_mirrored() {
            base.mirrored_vertical()
        } else {
            base
        };
        Ok(spec.rotated(rotation))
    }

    /// The unmirrored, unrotated layout. Inputs accept from the bottom and
    /// outputs face the top.
    fn base_spec(self) -> Result<VariantSpec, ConfigError> {
        let footprint = self.footprint();
        let (processor_type, acceptor_slots, ejector_slots) = match self.kind() {
            BuildingKind::Cutter => {
                let processor_type = if self.is_quad() {
                    ProcessorType::CutterQuad
                } else {
                    ProcessorType::Cutter
                };
                let acceptors = vec![SlotGeometry::new(
                    TilePos::new(0, 0),
                    &[Direction::Bottom],
                    Some(ItemKind::Shape),
                )?];
                let ejectors = (0..processor_type.output_slots())
                    .map(|x| EjectorSlotSpec::new(TilePos::new(x as i32, 0), Direction::Top))
                    .collect();
                (processor_type, acceptors, ejectors)
            }
            BuildingKind::Mixer => {
                let acceptors = vec![
                    SlotGeometry::new(
                        TilePos::new(0, 0),
                        &[Direction::Bottom],
                        Some(ItemKind::Color),
                    )?,
                    SlotGeometry::new(
                        TilePos::new(1, 0),
                        &[Direction::Bottom],
                        Some(ItemKind::Color),
                    )?,
                ];
                let ejectors = vec![EjectorSlotSpec::new(TilePos::new(0, 0), Direction::Top)];
                (ProcessorType::Mixer, acceptors, ejectors)
            }
            BuildingKind::Stacker => {
                let acceptors = vec![
                    SlotGeometry::new(
                        TilePos::new(0, 0),
                        &[Direction::Bottom],
                        Some(ItemKind::Shape),
                    )?,
                    SlotGeometry::new(
                        TilePos::new(1, 0),
                        &[Direction::Bottom],
                        Some(ItemKind::Shape),
                    )?,
                ];
                let ejectors = vec![EjectorSlotSpec::new(TilePos::new(0, 0), Direction::Top)];
                (ProcessorType::Stacker, acceptors, ejectors)
            }
        };
        Ok(VariantSpec {
            footprint,
            acceptor_slots,
            ejector_slots,
            processor_type,
            inputs_per_charge: processor_type.inputs_per_charge(),
        })
    }
}

// ---------------------------------------------------------------------------
// VariantSpec
// ---------------------------------------------------------------------------

/// Everything a variant fixes at placement time. The slot lists become the
/// exclusive property of the acceptor and ejector components they
/// configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub footprint: Footprint,
    pub acceptor_slots: Vec<SlotGeometry>,
    pub ejector_slots: Vec<EjectorSlotSpec>,
    pub processor_type: ProcessorType,
    pub inputs_per_charge: u32,
}

impl VariantSpec {
    fn mirrored_vertical(self) -> VariantSpec {
        VariantSpec {
            acceptor_slots: self
                .acceptor_slots
                .into_iter()
                .map(SlotGeometry::mirrored_vertical)
                .collect(),
            ejector_slots: self
                .ejector_slots
                .into_iter()
                .map(|slot| EjectorSlotSpec::new(slot.pos, slot.direction.mirrored_vertical()))
                .collect(),
            ..self
        }
    }

    fn rotated(self, rotation: Rotation) -> VariantSpec {
        let footprint = self.footprint;
        VariantSpec {
            footprint: footprint.rotated(rotation),
            acceptor_slots: self
                .acceptor_slots
                .into_iter()
                .map(|slot| slot.rotated_in(footprint, rotation))
                .collect(),
            ejector_slots: self
                .ejector_slots
                .into_iter()
                .map(|slot| {
                    EjectorSlotSpec::new(
                        slot.pos.rotated_in(footprint, rotation),
                        slot.direction.rotated(rotation),
                    )
                })
                .collect(),
            ..self
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct NothingUnlocked;
    impl RewardGate for NothingUnlocked {
        fn is_unlocked(&self, _reward: Reward) -> bool {
            false
        }
    }

    struct QuadUnlocked;
    impl RewardGate for QuadUnlocked {
        fn is_unlocked(&self, reward: Reward) -> bool {
            reward == Reward::CutterQuad
        }
    }

    // -----------------------------------------------------------------------
    // Tag parsing
    // -----------------------------------------------------------------------

    #[test]
    fn known_tags_resolve() {
        assert_eq!(
            BuildingKind::Cutter.variant_from_tag("quad-mirrored"),
            Ok(BuildingVariant::CutterQuadMirrored)
        );
        assert_eq!(
            BuildingKind::Stacker.variant_from_tag("mirrored"),
            Ok(BuildingVariant::StackerMirrored)
        );
    }

    #[test]
    fn unknown_tag_is_fatal_and_descriptive() {
        let err = BuildingKind::Mixer.variant_from_tag("quad").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownVariant {
                building: "mixer",
                tag: "quad".to_string(),
            }
        );
    }

    #[test]
    fn tags_round_trip() {
        for variant in [
            BuildingVariant::CutterDefault,
            BuildingVariant::CutterMirrored,
            BuildingVariant::CutterQuad,
            BuildingVariant::CutterQuadMirrored,
            BuildingVariant::MixerDefault,
            BuildingVariant::MixerMirrored,
            BuildingVariant::StackerDefault,
            BuildingVariant::StackerMirrored,
        ] {
            assert_eq!(
                variant.kind().variant_from_tag(variant.tag()),
                Ok(variant)
            );
        }
    }

    // -----------------------------------------------------------------------
    // Footprints and processor types
    // -----------------------------------------------------------------------

    #[test]
    fn quad_variants_are_4x1_others_2x1() {
        assert_eq!(BuildingVariant::CutterQuad.footprint(), Footprint::new(4, 1));
        assert_eq!(
            BuildingVariant::CutterQuadMirrored.footprint(),
            Footprint::new(4, 1)
        );
        assert_eq!(
            BuildingVariant::CutterDefault.footprint(),
            Footprint::new(2, 1)
        );
        assert_eq!(
            BuildingVariant::MixerMirrored.footprint(),
            Footprint::new(2, 1)
        );
    }

    #[test]
    fn both_quad_variants_use_the_quad_processor() {
        // Membership covers the mirrored quad as well, not just the plain
        // quad.
        for variant in [
            BuildingVariant::CutterQuad,
            BuildingVariant::CutterQuadMirrored,
        ] {
            let spec = variant.spec(Rotation::Deg0).unwrap();
            assert_eq!(spec.processor_type, ProcessorType::CutterQuad);
            assert_eq!(spec.ejector_slots.len(), 4);
        }
        let spec = BuildingVariant::CutterMirrored.spec(Rotation::Deg0).unwrap();
        assert_eq!(spec.processor_type, ProcessorType::Cutter);
    }

    // -----------------------------------------------------------------------
    // Slot layouts
    // -----------------------------------------------------------------------

    #[test]
    fn cutter_default_layout() {
        let spec = BuildingVariant::CutterDefault.spec(Rotation::Deg0).unwrap();
        assert_eq!(spec.inputs_per_charge, 1);
        assert_eq!(spec.acceptor_slots.len(), 1);
        let acceptor = &spec.acceptor_slots[0];
        assert_eq!(acceptor.pos, TilePos::new(0, 0));
        assert!(acceptor.directions.contains(Direction::Bottom));
        assert_eq!(acceptor.filter, Some(ItemKind::Shape));
        assert_eq!(spec.ejector_slots.len(), 2);
        assert_eq!(spec.ejector_slots[0].pos, TilePos::new(0, 0));
        assert_eq!(spec.ejector_slots[1].pos, TilePos::new(1, 0));
        assert!(spec
            .ejector_slots
            .iter()
            .all(|s| s.direction == Direction::Top));
    }

    #[test]
    fn mixer_requires_two_color_inputs() {
        let spec = BuildingVariant::MixerDefault.spec(Rotation::Deg0).unwrap();
        assert_eq!(spec.inputs_per_charge, 2);
        assert_eq!(spec.acceptor_slots.len(), 2);
        assert!(spec
            .acceptor_slots
            .iter()
            .all(|s| s.filter == Some(ItemKind::Color)));
        assert_eq!(spec.ejector_slots.len(), 1);
    }

    #[test]
    fn mirrored_stacker_flips_directions_preserving_positions() {
        let base = BuildingVariant::StackerDefault.spec(Rotation::Deg0).unwrap();
        let mirrored = BuildingVariant::StackerMirrored
            .spec(Rotation::Deg0)
            .unwrap();
        assert_eq!(mirrored.processor_type, base.processor_type);
        for (b, m) in base.acceptor_slots.iter().zip(&mirrored.acceptor_slots) {
            assert_eq!(b.pos, m.pos);
            assert!(b.directions.contains(Direction::Bottom));
            assert!(m.directions.contains(Direction::Top));
        }
        for (b, m) in base.ejector_slots.iter().zip(&mirrored.ejector_slots) {
            assert_eq!(b.pos, m.pos);
            assert_eq!(b.direction, Direction::Top);
            assert_eq!(m.direction, Direction::Bottom);
        }
    }

    #[test]
    fn rotation_remaps_positions_and_directions() {
        let spec = BuildingVariant::CutterDefault
            .spec(Rotation::Deg90)
            .unwrap();
        assert_eq!(spec.footprint, Footprint::new(1, 2));
        // Input now arrives from the left, outputs leave to the right.
        assert!(spec.acceptor_slots[0].directions.contains(Direction::Left));
        assert!(spec
            .ejector_slots
            .iter()
            .all(|s| s.direction == Direction::Right));
        // All slots stay inside the rotated footprint.
        for slot in &spec.acceptor_slots {
            assert!(spec.footprint.contains(slot.pos));
        }
        for slot in &spec.ejector_slots {
            assert!(spec.footprint.contains(slot.pos));
        }
    }

    // -----------------------------------------------------------------------
    // Availability and unlock gating
    // -----------------------------------------------------------------------

    #[test]
    fn quad_variants_require_their_reward() {
        let locked = BuildingKind::Cutter.available_variants(&NothingUnlocked);
        assert_eq!(
            locked,
            vec![
                BuildingVariant::CutterDefault,
                BuildingVariant::CutterMirrored
            ]
        );
        let unlocked = BuildingKind::Cutter.available_variants(&QuadUnlocked);
        assert!(unlocked.contains(&BuildingVariant::CutterQuad));
        assert!(unlocked.contains(&BuildingVariant::CutterQuadMirrored));
    }

    #[test]
    fn building_unlock_uses_its_reward() {
        assert!(!BuildingKind::Mixer.is_unlocked(&NothingUnlocked));
        assert!(BuildingKind::Mixer.is_unlocked(&AllUnlocked));
        assert_eq!(
            BuildingKind::Cutter.required_reward(),
            Reward::CutterAndTrash
        );
    }

    #[test]
    fn mixer_and_stacker_have_no_quad_variants() {
        for kind in [BuildingKind::Mixer, BuildingKind::Stacker] {
            let variants = kind.available_variants(&AllUnlocked);
            assert_eq!(variants.len(), 2);
            assert!(variants.iter().all(|v| !v.is_quad()));
        }
    }
}
