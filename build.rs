use std::path::Path;

fn main() {
    let registry_path = Path::new("registry/ontology_types.json");
    validate_registry_file(registry_path);
    set_build_dependencies();
}

fn validate_registry_file(registry_path: &Path) {
    // Ensure registry exists at build time
    assert!(
        registry_path.exists(),
        "\n\nREGISTRY BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the ontology type registry before building.\n",
        registry_path.display()
    );

    let registry_contents = std::fs::read_to_string(registry_path).unwrap_or_else(|e| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            registry_path.display()
        );
    });

    let registry: serde_json::Value = serde_json::from_str(&registry_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            registry_path.display()
        );
    });

    validate_registry_structure(&registry);
}

fn validate_registry_structure(registry: &serde_json::Value) {
    assert!(
        registry.is_object(),
        "\n\nREGISTRY BUILD ERROR: Root must be a JSON object\n\
         Got: {registry}\n"
    );

    let types = registry.get("ontology_types").unwrap_or_else(|| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: Missing 'ontology_types' field\n\
             The registry must have a top-level 'ontology_types' array.\n"
        );
    });

    let types = types.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: 'ontology_types' must be an array\n\
             Got: {types}\n"
        );
    });

    let mut total_databases = 0;
    for (i, ontology_type) in types.iter().enumerate() {
        total_databases += validate_ontology_type(ontology_type, i);
    }

    println!(
        "cargo:warning=Validated registry: {} ontology types, {total_databases} databases",
        types.len()
    );
}

fn validate_ontology_type(ontology_type: &serde_json::Value, index: usize) -> usize {
    let type_name = ontology_type
        .get("type_name")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            panic!("\n\nREGISTRY BUILD ERROR: Ontology type at index {index} missing 'type_name' field\n")
        });

    let default_database = ontology_type
        .get("default_database")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            panic!("\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' missing 'default_database' field\n")
        });

    if let Some(service) = ontology_type.get("service") {
        let known = ["oxo", "mygene", "mychem"];
        assert!(
            service.as_str().is_some_and(|s| known.contains(&s)),
            "\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' has unknown service {service}\n\
             Expected one of: {}\n",
            known.join(", ")
        );
    }

    let databases = ontology_type
        .get("databases")
        .and_then(|v| v.as_array())
        .unwrap_or_else(|| {
            panic!("\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' missing 'databases' array\n")
        });

    assert!(
        !databases.is_empty(),
        "\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' has no databases\n"
    );

    let names: Vec<&str> = databases
        .iter()
        .map(|db| {
            db.get("name").and_then(|v| v.as_str()).unwrap_or_else(|| {
                panic!("\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' has a database without 'name'\n")
            })
        })
        .collect();

    assert!(
        names.contains(&default_database),
        "\n\nREGISTRY BUILD ERROR: Ontology type '{type_name}' default database '{default_database}' \
         is not one of its databases ({})\n",
        names.join(", ")
    );

    names.len()
}

fn set_build_dependencies() {
    // Tell cargo to rerun if registry changes
    println!("cargo:rerun-if-changed=registry/ontology_types.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
