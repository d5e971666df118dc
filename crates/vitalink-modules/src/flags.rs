//! Flag-cascade: collapsing field-level RAG counts into one canonical
//! per-result flag with precedence red > amber > gray.

use vitalink_core::models::flags::Flags;
use vitalink_core::models::primitive::Primitive;

/// Collapse a count vector to at most one non-zero entry.
pub fn collapse(counts: Flags) -> Flags {
    if counts.red > 0 {
        Flags { red: 1, amber: 0, gray: 0 }
    } else if counts.amber > 0 {
        Flags { red: 0, amber: 1, gray: 0 }
    } else if counts.gray > 0 {
        Flags { red: 0, amber: 0, gray: 1 }
    } else {
        Flags::default()
    }
}

/// Collapse the union of field-level counts across every primitive of one
/// logical result, so a submission contributes exactly one flag unit.
///
/// The single unit lands on the first primitive that carried the winning
/// color; every other primitive's flags are zeroed. A slice of one behaves
/// exactly like [`collapse`] on that primitive's counts.
pub fn apply_overall_flags_logic(primitives: &mut [Primitive]) {
    let mut union = Flags::default();
    for primitive in primitives.iter() {
        if let Some(flags) = &primitive.flags {
            union.add(flags);
        }
    }
    let Some(winner) = union.most_severe() else {
        return;
    };

    let carrier = primitives
        .iter()
        .position(|p| p.flags.is_some_and(|f| f.count(winner) > 0));

    for primitive in primitives.iter_mut() {
        if primitive.flags.is_some() {
            primitive.flags = Some(Flags::default());
        }
    }
    if let Some(index) = carrier {
        let mut flags = Flags::default();
        flags.increment(winner);
        primitives[index].flags = Some(flags);
    }
}
