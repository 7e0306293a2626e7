use imgforge_core::lockfile::{ImageLock, LockedPackage};
use imgforge_core::package::EcosystemKind;
use tempfile::TempDir;

fn sample() -> ImageLock {
    ImageLock {
        image: "bookworm-minimal".to_string(),
        ecosystem: EcosystemKind::Deb,
        package: vec![
            LockedPackage {
                name: "bash".to_string(),
                version: "5.2.15-2+b2".to_string(),
                url: "http://deb.debian.org/debian/pool/main/b/bash/bash_5.2.15-2+b2_amd64.deb"
                    .to_string(),
                dependencies: vec!["libc6".to_string()],
            },
            LockedPackage {
                name: "libc6".to_string(),
                version: "2.36-9".to_string(),
                url: String::new(),
                dependencies: vec![],
            },
        ],
    }
}

#[test]
fn round_trip_serialize_deserialize() {
    let lock = sample();
    let serialized = lock.to_string_pretty().unwrap();
    let deserialized: ImageLock = toml::from_str(&serialized).unwrap();

    assert_eq!(deserialized.image, "bookworm-minimal");
    assert_eq!(deserialized.ecosystem, EcosystemKind::Deb);
    assert_eq!(deserialized.package, lock.package);
}

#[test]
fn serialized_form_is_readable() {
    let serialized = sample().to_string_pretty().unwrap();
    assert!(serialized.contains("ecosystem = \"deb\""));
    assert!(serialized.contains("[[package]]"));
    assert!(serialized.contains("name = \"libc6\""));
}

#[test]
fn write_then_load() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("imgforge.lock");
    sample().write(&path).unwrap();
    let loaded = ImageLock::from_path(&path).unwrap();
    assert_eq!(loaded.locked_version("bash"), Some("5.2.15-2+b2"));
    assert_eq!(loaded.locked_version("zsh"), None);
}

#[test]
fn empty_lock_round_trips() {
    let lock = ImageLock {
        image: "empty".to_string(),
        ecosystem: EcosystemKind::Rpm,
        package: vec![],
    };
    let serialized = lock.to_string_pretty().unwrap();
    let deserialized: ImageLock = toml::from_str(&serialized).unwrap();
    assert!(deserialized.package.is_empty());
    assert_eq!(deserialized.ecosystem, EcosystemKind::Rpm);
}
