//! Display-label normalization for reference-table rows.
//!
//! Tables name their rows differently (`name`, `code`, `number`, `full_name`);
//! everything that shows a row goes through one of these chains.

use crate::domain::entities::AdminEntity;

/// Shown when no naming field is present.
pub const LABEL_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Name,
    Code,
    Number,
    FullName,
}

/// Directory tables: `name → code → number → full_name`.
pub const DIRECTORY_CHAIN: &[LabelField] = &[
    LabelField::Name,
    LabelField::Code,
    LabelField::Number,
    LabelField::FullName,
];

/// Groups are known by code first.
pub const GROUP_CHAIN: &[LabelField] = &[LabelField::Code, LabelField::Name];

/// Teachers are known by full name first.
pub const TEACHER_CHAIN: &[LabelField] = &[LabelField::FullName, LabelField::Name];

/// Rooms are known by number first.
pub const ROOM_CHAIN: &[LabelField] = &[LabelField::Number, LabelField::Name];

fn field(entity: &AdminEntity, f: LabelField) -> Option<&str> {
    let value = match f {
        LabelField::Name => entity.name.as_deref(),
        LabelField::Code => entity.code.as_deref(),
        LabelField::Number => entity.number.as_deref(),
        LabelField::FullName => entity.full_name.as_deref(),
    };
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// First non-empty field along `chain`, then the rest of the directory chain, then the placeholder.
pub fn label_with(entity: &AdminEntity, chain: &[LabelField]) -> String {
    chain
        .iter()
        .chain(DIRECTORY_CHAIN)
        .find_map(|f| field(entity, *f))
        .unwrap_or(LABEL_PLACEHOLDER)
        .to_string()
}

pub fn display_label(entity: &AdminEntity) -> String {
    label_with(entity, DIRECTORY_CHAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: Option<&str>, code: Option<&str>, number: Option<&str>, full: Option<&str>) -> AdminEntity {
        AdminEntity {
            id: 1,
            name: name.map(String::from),
            code: code.map(String::from),
            number: number.map(String::from),
            full_name: full.map(String::from),
        }
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(display_label(&entity(Some("Физика"), Some("F"), None, None)), "Физика");
        assert_eq!(display_label(&entity(None, Some("ПИ-101"), Some("1"), None)), "ПИ-101");
        assert_eq!(display_label(&entity(None, None, Some("204"), None)), "204");
        assert_eq!(display_label(&entity(None, None, None, Some("Иванов И.И."))), "Иванов И.И.");
        assert_eq!(display_label(&entity(None, None, None, None)), LABEL_PLACEHOLDER);
    }

    #[test]
    fn test_blank_fields_are_skipped() {
        assert_eq!(display_label(&entity(Some("  "), Some("IS-202"), None, None)), "IS-202");
    }

    #[test]
    fn test_group_chain_prefers_code() {
        let g = entity(Some("Информатика 1"), Some("ИТ-101"), None, None);
        assert_eq!(label_with(&g, GROUP_CHAIN), "ИТ-101");
        assert_eq!(label_with(&entity(None, None, Some("5"), None), TEACHER_CHAIN), "5");
    }
}
