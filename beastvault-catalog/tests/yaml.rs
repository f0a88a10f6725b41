use beastvault_catalog::{load_reference, load_species, ElementType, YamlError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_yaml(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn load_species_from_yaml() {
    let tmp = TempDir::new().unwrap();
    write_yaml(
        tmp.path(),
        "gen1.yaml",
        r#"
- id: 1
  name: Bulbasaur
  primary_type: grass
  secondary_type: poison
- id: 4
  name: Charmander
  primary_type: fire
"#,
    );

    let species = load_species(tmp.path()).unwrap();
    assert_eq!(species.len(), 2);
    assert_eq!(species[0].name, "Bulbasaur");
    assert_eq!(species[0].secondary_type, Some(ElementType::Poison));
    assert_eq!(species[1].secondary_type, None);
}

#[test]
fn later_files_override_earlier_rows() {
    let tmp = TempDir::new().unwrap();
    write_yaml(
        tmp.path(),
        "a.yaml",
        "- id: 35\n  name: Clefairy\n  primary_type: normal\n",
    );
    write_yaml(
        tmp.path(),
        "b.yml",
        "- id: 35\n  name: Clefairy\n  primary_type: fairy\n",
    );
    write_yaml(tmp.path(), "notes.txt", "ignored");

    let tables = load_reference(tmp.path()).unwrap();
    assert_eq!(tables.species_count(), 1);
    assert_eq!(tables.type_pair(35).unwrap().primary, ElementType::Fairy);
}

#[test]
fn missing_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    let species = load_species(&tmp.path().join("nope")).unwrap();
    assert!(species.is_empty());
}

#[test]
fn file_instead_of_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("species.yaml");
    fs::write(&file, "[]").unwrap();
    assert!(matches!(load_species(&file), Err(YamlError::DirNotFound(_))));
}

#[test]
fn malformed_yaml_reports_the_file() {
    let tmp = TempDir::new().unwrap();
    write_yaml(tmp.path(), "bad.yaml", "- id: one\n  name: [\n");
    match load_species(tmp.path()) {
        Err(YamlError::Parse { path, .. }) => assert!(path.ends_with("bad.yaml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}
