use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sdg_core::backend::ManifestLoader;
use sdg_core::{BackendProvider, BackendRegistry, GenerationRun, SpecDrivenGenerator, SpecInfo};
use sdg_spring_server::{BACKEND_NAME, SpringServerProvider};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn generator() -> SpecDrivenGenerator {
    SpecDrivenGenerator::new(vec![Arc::new(SpringServerProvider)])
}

fn petstore_run(out: &Path) -> GenerationRun {
    GenerationRun::new(BACKEND_NAME, out).with_spec(
        SpecInfo::new(fixture("petstore.yaml"))
            .with_api_package("io.pets.api")
            .with_model_package("io.pets.model"),
    )
}

fn read(out: &Path, relative: &str) -> String {
    fs::read_to_string(out.join(relative)).unwrap()
}

#[test]
fn generates_controllers_models_and_supporting_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");

    let report = generator().generate(petstore_run(&out)).unwrap();

    let relative: Vec<PathBuf> = report
        .files
        .iter()
        .map(|f| f.strip_prefix(&out).unwrap().to_path_buf())
        .collect();
    let expected: Vec<PathBuf> = [
        "io/pets/model/Pet.java",
        "io/pets/model/Category.java",
        "io/pets/model/PetStatus.java",
        "io/pets/model/Error.java",
        "io/pets/model/Dog.java",
        "io/pets/api/PetsRestController.java",
        "io/pets/api/StoreRestController.java",
        "io/pets/api/ApiException.java",
        "io/pets/api/ApiOriginFilter.java",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(relative, expected);
    assert_eq!(report.file_count(), 9);
    assert!(report.files.iter().all(|f| f.is_file()));
}

#[test]
fn controllers_return_response_entities() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    generator().generate(petstore_run(&out)).unwrap();

    let pets = read(&out, "io/pets/api/PetsRestController.java");
    assert!(pets.starts_with("package io.pets.api;\n"));
    assert!(pets.contains("import io.pets.model.*;"));
    assert!(pets.contains("@RequestMapping(\"/pets\")\npublic interface PetsRestController {"));

    // listPets declares List<Pet> and Error, so the envelope is untyped.
    assert!(pets.contains(
        "ResponseEntity<?> listPets(@RequestParam(value = \"limit\", required = false) Integer limit);"
    ));
    assert!(pets.contains(
        "@RequestMapping(value = \"\", method = RequestMethod.POST, produces = { \"application/json\" }, consumes = { \"application/json\" })"
    ));
    assert!(pets.contains("ResponseEntity<?> createPet(@RequestBody Pet body);"));
    assert!(pets.contains("ResponseEntity<?> showPetById(@PathVariable(\"petId\") Long petId);"));
    assert!(pets.contains(
        "@RequestMapping(value = \"/{petId}\", method = RequestMethod.GET, produces = { \"application/json\" })"
    ));
    assert!(pets.contains("@RequestMapping(value = \"/{petId}\", method = RequestMethod.DELETE)\n"));
    assert!(pets.contains("ResponseEntity<Void> deletePet(@PathVariable(\"petId\") Long petId);"));
    assert!(pets.contains(
        "@RequestMapping(value = \"/{petId}/photos\", method = RequestMethod.GET, produces = { \"application/json\" })"
    ));
    assert!(pets.contains(
        "ResponseEntity<List<String>> listPetPhotos(@PathVariable(\"petId\") Long petId);"
    ));
    assert!(pets.contains("     * List all pets\n"));
    // GET handlers never declare a consumed media type.
    assert_eq!(pets.matches("consumes = ").count(), 1);

    let store = read(&out, "io/pets/api/StoreRestController.java");
    assert!(store.contains("@RequestMapping(\"/store\")"));
    assert!(store.contains("value = \"/inventory\""));
    assert!(store.contains("ResponseEntity<Map<String, Integer>> getInventory();"));
}

/// `(method, value)` of every handler mapping, with the path variables its signature binds.
fn handler_routes(controller: &str) -> Vec<(String, String, Vec<String>)> {
    let mut routes = Vec::new();
    let mut mapping: Option<(String, String)> = None;
    for line in controller.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("@RequestMapping(value = \"") {
            let (value, rest) = rest.split_once('"').unwrap();
            let method = rest
                .split("RequestMethod.")
                .nth(1)
                .unwrap()
                .split(|c: char| !c.is_ascii_alphabetic())
                .next()
                .unwrap();
            mapping = Some((method.to_string(), value.to_string()));
        } else if line.starts_with("ResponseEntity<") {
            let (method, value) = mapping.take().unwrap();
            let variables = line
                .split("@PathVariable(\"")
                .skip(1)
                .map(|rest| rest.split('"').next().unwrap().to_string())
                .collect();
            routes.push((method, value, variables));
        }
    }
    routes
}

#[test]
fn controller_mappings_are_routable() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    generator().generate(petstore_run(&out)).unwrap();

    for controller in ["io/pets/api/PetsRestController.java", "io/pets/api/StoreRestController.java"] {
        let routes = handler_routes(&read(&out, controller));
        assert!(!routes.is_empty(), "{controller}");

        let mut seen = std::collections::HashSet::new();
        for (method, value, variables) in &routes {
            assert!(seen.insert((method.clone(), value.clone())), "{controller}: {method} {value:?} mapped twice");
            for variable in variables {
                assert!(
                    value.contains(&format!("{{{variable}}}")),
                    "{controller}: {method} {value:?} binds {variable}"
                );
            }
        }
    }

    let pets = handler_routes(&read(&out, "io/pets/api/PetsRestController.java"));
    let mapped: Vec<(&str, &str)> = pets.iter().map(|(m, v, _)| (m.as_str(), v.as_str())).collect();
    assert_eq!(
        mapped,
        [
            ("GET", ""),
            ("POST", ""),
            ("GET", "/{petId}"),
            ("DELETE", "/{petId}"),
            ("GET", "/{petId}/photos"),
        ]
    );
}

#[test]
fn models_are_jackson_beans() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    generator().generate(petstore_run(&out)).unwrap();

    let pet = read(&out, "io/pets/model/Pet.java");
    assert!(pet.starts_with("package io.pets.model;\n"));
    assert!(pet.contains("public class Pet {"));
    assert!(pet.contains("    /** The pet's name */\n    @JsonProperty(\"name\")\n    private String name;"));
    assert!(pet.contains("@JsonProperty(\"photoUrls\")\n    private List<String> photoUrls;"));
    assert!(pet.contains("private LocalDate birthday;"));
    assert!(pet.contains("private PetStatus status;"));
    assert!(pet.contains("public Long getId() {"));
    // Read-only properties get no setter.
    assert!(!pet.contains("setId("));
    assert!(pet.contains("public void setName(String name) {"));

    let dog = read(&out, "io/pets/model/Dog.java");
    assert!(dog.contains("public class Dog extends Pet {"));
    assert!(dog.contains("private String breed;"));

    let status = read(&out, "io/pets/model/PetStatus.java");
    assert!(status.contains("public enum PetStatus {"));
    assert!(status.contains("    AVAILABLE(\"available\"),\n"));
    assert!(status.contains("    SOLD(\"sold\");\n"));
    assert!(status.contains("@JsonValue"));
}

#[test]
fn builder_mode_and_properties() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let run = petstore_run(&out)
        .enable_builder_support(true)
        .with_property("serializableModel", true);
    generator().generate(run).unwrap();

    let pet = read(&out, "io/pets/model/Pet.java");
    assert!(pet.contains("@JsonDeserialize(builder = Pet.Builder.class)"));
    assert!(pet.contains("public class Pet implements java.io.Serializable {"));
    assert!(pet.contains("private final String name;"));
    assert!(pet.contains("public static final class Builder {"));
    assert!(pet.contains("public Builder photoUrls(List<String> photoUrls) {"));

    // Enums keep their plain shape in builder mode.
    let status = read(&out, "io/pets/model/PetStatus.java");
    assert!(status.contains("public enum PetStatus {"));
    assert!(!status.contains("Builder"));
}

#[test]
fn supporting_files_can_be_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let report = generator()
        .generate(petstore_run(&out).exclude_supporting_files(true))
        .unwrap();

    assert_eq!(report.file_count(), 7);
    assert!(!out.join("io/pets/api/ApiException.java").exists());
    assert!(!out.join("io/pets/api/ApiOriginFilter.java").exists());
}

#[test]
fn model_only_document_skips_controllers() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let run = GenerationRun::new(BACKEND_NAME, &out).with_spec(
        SpecInfo::new(fixture("petstore.yaml"))
            .with_api_package("io.pets.api")
            .skip_api(true),
    );
    let report = generator().generate(run).unwrap();

    // Model package defaults to the API package.
    assert_eq!(report.file_count(), 5);
    assert!(out.join("io/pets/api/Pet.java").is_file());
    assert!(!out.join("io/pets/api/PetsRestController.java").exists());
    assert!(!out.join("io/pets/api/ApiException.java").exists());
}

#[test]
fn resolving_twice_returns_the_same_instance() {
    let provider: Arc<dyn BackendProvider> = Arc::new(SpringServerProvider);
    let mut registry = BackendRegistry::discover(&[provider], &[], Arc::new(ManifestLoader));

    registry
        .resolve(BACKEND_NAME)
        .unwrap()
        .properties_mut()
        .insert("marker".to_string(), serde_json::json!(1));
    let again = registry.resolve(BACKEND_NAME).unwrap();
    assert_eq!(again.properties()["marker"], serde_json::json!(1));
    assert_eq!(again.name(), BACKEND_NAME);
}
