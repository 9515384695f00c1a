use sbscript_core::archive::{
    extract_sb3, load_project, locate_project_json, read_project_json_from_sb3,
};
use sbscript_core::{convert_project, convert_target_source, ConvertOptions, Project};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

fn project_json() -> String {
    json!({
        "targets": [
            {
                "isStage": true,
                "name": "Stage",
                "variables": { "v1": ["score", 0] },
                "lists": {},
                "blocks": {}
            },
            {
                "isStage": false,
                "name": "Cat",
                "variables": {},
                "lists": {},
                "blocks": {
                    "hat": {
                        "opcode": "event_whenflagclicked",
                        "next": "say",
                        "inputs": {},
                        "fields": {},
                        "topLevel": true,
                        "x": 48,
                        "y": 64
                    },
                    "say": {
                        "opcode": "looks_say",
                        "next": null,
                        "inputs": { "MESSAGE": [1, [10, "meow"]] },
                        "fields": {},
                        "topLevel": false
                    }
                }
            }
        ],
        "monitors": []
    })
    .to_string()
}

fn write_sb3(path: &Path, project: &str) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("project.json", opts).unwrap();
    zip.write_all(project.as_bytes()).unwrap();
    zip.start_file("0a1b2c.svg", opts).unwrap();
    zip.write_all(b"<svg/>").unwrap();
    zip.finish().unwrap();
}

#[test]
fn reads_project_json_from_archive() {
    let dir = tempfile::tempdir().unwrap();
    let sb3 = dir.path().join("game.sb3");
    write_sb3(&sb3, &project_json());
    let source = read_project_json_from_sb3(&sb3).unwrap();
    assert_eq!(source, project_json());
}

#[test]
fn extracts_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let sb3 = dir.path().join("game.sb3");
    write_sb3(&sb3, &project_json());
    let out = dir.path().join("game.sb3.extract");
    let count = extract_sb3(&sb3, &out).unwrap();
    assert_eq!(count, 2);
    assert_eq!(fs::read(out.join("0a1b2c.svg")).unwrap(), b"<svg/>");
    assert_eq!(locate_project_json(&out).unwrap(), out.join("project.json"));
}

#[test]
fn non_zip_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("broken.sb3");
    fs::write(&bogus, b"not a zip").unwrap();
    let err = read_project_json_from_sb3(&bogus).unwrap_err();
    assert!(err.to_string().contains("not a valid zip"), "got: {}", err);
}

#[test]
fn locates_project_json_in_nested_tree() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("b").join("inner");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(nested.join("project.json"), project_json()).unwrap();
    assert_eq!(
        locate_project_json(dir.path()).unwrap(),
        nested.join("project.json")
    );
    let project = load_project(dir.path()).unwrap();
    assert_eq!(project.targets.len(), 2);
}

#[test]
fn missing_project_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(locate_project_json(dir.path()).is_err());
}

#[test]
fn loads_from_json_file_and_archive_alike() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("project.json");
    fs::write(&json_path, project_json()).unwrap();
    let sb3 = dir.path().join("game.sb3");
    write_sb3(&sb3, &project_json());

    let from_json = load_project(&json_path).unwrap();
    let from_sb3 = load_project(&sb3).unwrap();
    assert_eq!(from_json.targets[1].name, "Cat");
    assert_eq!(from_sb3.targets[1].blocks.len(), 2);
}

#[test]
fn invalid_project_reports_its_origin() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("project.json");
    fs::write(&json_path, "{\"monitors\": []}").unwrap();
    let err = load_project(&json_path).unwrap_err();
    assert!(format!("{:#}", err).contains("targets"), "got: {:#}", err);
}

#[test]
fn writes_one_script_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::from_json_str(&project_json()).unwrap();
    let out = dir.path().join("script");
    let written = convert_project(&project, &out, &ConvertOptions::default()).unwrap();
    assert_eq!(written, vec![out.join("Stage.scs"), out.join("Cat.scs")]);

    let cat = fs::read_to_string(out.join("Cat.scs")).unwrap();
    assert_eq!(
        cat,
        "// Generate by scratch-script\n\
         #meta(false, \"Cat\");\n\
         @(48, 64)\n\
         event_whenflagclicked({\n    looks_say(\"meow\");\n});\n"
    );
    let stage = fs::read_to_string(out.join("Stage.scs")).unwrap();
    assert!(stage.contains("#init_var(\"score\", 0);"));
}

#[test]
fn keep_going_skips_broken_targets() {
    let mut value: serde_json::Value = serde_json::from_str(&project_json()).unwrap();
    value["targets"][0]["blocks"] = json!({
        "hat": {
            "opcode": "event_whenflagclicked",
            "next": "missing",
            "inputs": {},
            "fields": {},
            "topLevel": true
        }
    });
    let project = Project::from_value(&value).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let strict = convert_project(&project, dir.path(), &ConvertOptions::default());
    assert!(strict.is_err());

    let options = ConvertOptions {
        keep_going: true,
        ..ConvertOptions::default()
    };
    let written = convert_project(&project, dir.path(), &options).unwrap();
    assert_eq!(written, vec![dir.path().join("Cat.scs")]);
}

#[test]
fn custom_extension_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::from_json_str(&project_json()).unwrap();
    let options = ConvertOptions {
        extension: "txt".to_string(),
        ..ConvertOptions::default()
    };
    let written = convert_project(&project, dir.path(), &options).unwrap();
    assert!(written.iter().all(|p| p.extension().unwrap() == "txt"));
}

#[test]
fn converts_a_single_target_by_name() {
    let text = convert_target_source(&project_json(), "Cat").unwrap();
    assert!(text.contains("looks_say(\"meow\");"));
    assert!(convert_target_source(&project_json(), "Dog").is_err());
}
