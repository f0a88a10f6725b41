//! Field-by-field comparison of two catalog entries.

use std::fmt;

use beastvault_catalog::EntryAttributes;

/// One attribute whose value differs between two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub field: &'static str,
    pub left: String,
    pub right: String,
    /// Set for fields a traded or re-exported entry should never change.
    pub unexpected: bool,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.left, self.right)?;
        if self.unexpected {
            write!(f, " (unexpected)")?;
        }
        Ok(())
    }
}

fn optional(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{}'", v),
        None => "-".to_string(),
    }
}

struct Differences(Vec<Difference>);

impl Differences {
    fn check<T: PartialEq + fmt::Display>(&mut self, field: &'static str, left: T, right: T) {
        self.push(field, left, right, false);
    }

    /// Like [`check`](Self::check) for fields that should never change.
    fn check_fixed<T: PartialEq + fmt::Display>(
        &mut self,
        field: &'static str,
        left: T,
        right: T,
    ) {
        self.push(field, left, right, true);
    }

    fn push<T: PartialEq + fmt::Display>(
        &mut self,
        field: &'static str,
        left: T,
        right: T,
        unexpected: bool,
    ) {
        if left == right {
            return;
        }
        self.0.push(Difference {
            field,
            left: left.to_string(),
            right: right.to_string(),
            unexpected,
        });
    }
}

/// List the attributes that differ between two entries, in a fixed field
/// order. An empty result means the entries are identical.
pub fn compare_entries(left: &EntryAttributes, right: &EntryAttributes) -> Vec<Difference> {
    let mut d = Differences(Vec::new());

    d.check("Species", left.species_id, right.species_id);
    d.check("Form", left.form, right.form);
    d.check("Nickname", optional(&left.nickname), optional(&right.nickname));
    d.check("OT Name", &left.ot_name, &right.ot_name);
    d.check("TID", left.tid, right.tid);
    d.check("SID", left.sid, right.sid);
    d.check("Language", &left.language, &right.language);
    d.check_fixed("Origin Game", left.origin_game, right.origin_game);
    d.check_fixed("Shiny", left.is_shiny, right.is_shiny);
    d.check_fixed("Gender", left.gender.as_str(), right.gender.as_str());
    d.check_fixed("Nature", left.nature, right.nature);
    d.check_fixed("Ball", left.ball_id, right.ball_id);
    d.check_fixed("Met Date", optional(&left.met_date), optional(&right.met_date));
    d.check_fixed("Met Location", optional(&left.met_location), optional(&right.met_location));
    d.check("Level", left.level, right.level);
    d.check("Ability", left.ability_id, right.ability_id);
    d.check("Held Item", left.held_item_id, right.held_item_id);
    d.check(
        "Tera Type",
        left.tera_type.map_or("-".to_string(), |t| t.to_string()),
        right.tera_type.map_or("-".to_string(), |t| t.to_string()),
    );
    d.check("Egg", left.is_egg, right.is_egg);

    d.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use beastvault_catalog::Gender;

    fn sample() -> EntryAttributes {
        EntryAttributes {
            species_id: 25,
            nickname: Some("Sparky".into()),
            ot_name: "Ash".into(),
            tid: 12345,
            level: 20,
            origin_game: 50,
            gender: Gender::Male,
            ..Default::default()
        }
    }

    #[test]
    fn identical_entries_have_no_differences() {
        assert!(compare_entries(&sample(), &sample()).is_empty());
    }

    #[test]
    fn differences_follow_field_order() {
        let before = sample();
        let mut after = sample();
        after.level = 36;
        after.nickname = None;
        after.origin_game = 51;

        let diffs = compare_entries(&before, &after);
        let fields: Vec<_> = diffs.iter().map(|d| d.field).collect();
        assert_eq!(fields, vec!["Nickname", "Origin Game", "Level"]);
        assert_eq!(diffs[0].to_string(), "Nickname: 'Sparky' -> -");
        assert!(diffs[1].unexpected);
        assert_eq!(diffs[1].to_string(), "Origin Game: 50 -> 51 (unexpected)");
        assert!(!diffs[2].unexpected);
    }
}
