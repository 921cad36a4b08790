//! Integration tests for aptdm-ds API endpoints
//!
//! Each test builds the router over a fresh temporary datasets root and
//! drives it with `oneshot`.

use std::path::Path;

use aptdm_common::DataStore;
use aptdm_ds::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "aptdm-test-boundary";

/// Test helper: router over `root`
fn setup_app(root: &Path) -> Router {
    build_router(AppState::new(DataStore::new(root)))
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a multipart/form-data request: optional JSON `metadata` part plus
/// `(field, file name, contents)` file parts
fn multipart_request(
    uri: &str,
    metadata: Option<&Value>,
    files: &[(&str, &str, &str)],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(metadata) = metadata {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\
                 Content-Type: application/json\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
    }
    for (field, file_name, contents) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn dataset_form() -> Value {
    json!({
        "title": "Sample dataset",
        "abstract": "Dataset for unittest",
        "authors": [
            {"first_name": "Logan", "last_name": "Ward", "affiliation": "UChicago"}
        ]
    })
}

fn sample_metadata(name: &str) -> Value {
    json!({
        "information": {
            "sample_name": name,
            "sample_title": "Example Sample",
            "sample_description": "Sample description",
            "metadata": [{"key": "Aging time", "value": "2 hours"}]
        },
        "collection": {
            "leap_model": "4000 Si X",
            "evaporation_mode": "laser",
            "voltage_ratio": 1.0,
            "laser_pulse_energy": 30.0,
            "temperature": 40.0
        },
        "preparation": {
            "preparation_method": "electropolish",
            "electropolish": [{"solution": "10% perchloric", "voltage": 15.0}]
        }
    })
}

async fn create_dataset(app: &Router) -> String {
    let (status, body) = send(app, json_request("POST", "/api/datasets", &dataset_form())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["name"].as_str().unwrap().to_string()
}

async fn create_sample(app: &Router, dataset: &str) {
    let (status, body) = send(
        app,
        multipart_request(
            &format!("/api/datasets/{dataset}/samples"),
            Some(&sample_metadata("Sample1")),
            &[("rhit_file", "EXAMPLE.RHIT", "My RHIT file contents")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "aptdm-ds");
    assert!(body["version"].is_string());
    assert_eq!(body["datasets_root_available"], true);
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, body) = send(&app, get("/api/buildinfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_analysis_presets() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, body) = send(&app, get("/api/analysis-presets")).await;
    assert_eq!(status, StatusCode::OK);
    let presets = body["presets"].as_array().unwrap();
    assert_eq!(presets.len(), 6);
    assert_eq!(presets[1]["key"], "mass_spec");
    assert_eq!(presets[1]["folder_name"], "Mass_Spectrum");
}

// =============================================================================
// Datasets
// =============================================================================

#[tokio::test]
async fn test_create_and_list_datasets() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let first = create_dataset(&app).await;
    let second = create_dataset(&app).await;
    assert!(first.ends_with("_Ward_0"), "{first}");
    assert!(second.ends_with("_Ward_1"), "{second}");

    // A broken dataset still shows up, with its problem
    std::fs::create_dir(tmp.path().join("broken")).unwrap();

    let (status, body) = send(&app, get("/api/datasets")).await;
    assert_eq!(status, StatusCode::OK);
    let datasets = body["datasets"].as_array().unwrap();
    assert_eq!(datasets.len(), 3);
    assert_eq!(datasets[2]["name"], "broken");
    assert_eq!(datasets[2]["valid"], false);
    assert!(datasets[2]["errors"][0].is_string());
    assert_eq!(datasets[0]["title"], "Sample dataset");
    assert_eq!(datasets[0]["published"], false);
}

#[tokio::test]
async fn test_create_dataset_reports_every_error() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let form = json!({"title": "", "abstract": "", "authors": []});
    let (status, body) = send(&app, json_request("POST", "/api/datasets", &form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_METADATA");
    assert_eq!(body["error"]["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_missing_dataset() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, body) = send(&app, get("/api/datasets/bogus")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, get("/api/datasets/..%2Fetc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_get_json_error_body() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, body) = send(
        &app,
        json_request("POST", "/api/datasets", &json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("abstract"));

    // Creation routes need multipart, not JSON
    let name = create_dataset(&app).await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/datasets/{name}/samples"),
            &sample_metadata("Sample1"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_utf8_metadata_is_invalid_metadata() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    std::fs::write(
        tmp.path().join(&name).join("GeneralMetadata.yml"),
        b"title: \xff\xfe\n",
    )
    .unwrap();

    let (status, body) = send(&app, get(&format!("/api/datasets/{name}"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_METADATA");
}

#[tokio::test]
async fn test_listing_marks_directories_lookups_refuse() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let copy = tmp.path().join("Old-Dataset");
    std::fs::create_dir(&copy).unwrap();
    std::fs::copy(
        tmp.path().join(&name).join("GeneralMetadata.yml"),
        copy.join("GeneralMetadata.yml"),
    )
    .unwrap();

    let (_, body) = send(&app, get("/api/datasets")).await;
    let datasets = body["datasets"].as_array().unwrap();
    let old = datasets
        .iter()
        .find(|d| d["name"] == "Old-Dataset")
        .unwrap();
    assert_eq!(old["valid"], false);
    assert!(old["errors"][0].is_string());

    let (status, _) = send(&app, get("/api/datasets/Old-Dataset")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_dataset() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let mut form = dataset_form();
    form["title"] = json!("Renamed dataset");
    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/api/datasets/{name}"), &form),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["title"], "Renamed dataset");

    let (_, body) = send(&app, get(&format!("/api/datasets/{name}"))).await;
    assert_eq!(body["metadata"]["title"], "Renamed dataset");
    assert!(body["metadata"]["dates"]["creation_date"].is_string());
}

// =============================================================================
// Samples
// =============================================================================

#[tokio::test]
async fn test_sample_defaults() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let uri = format!("/api/datasets/{name}/samples/defaults");
    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["information"]["sample_name"], "Sample1");
    assert_eq!(body["collection"]["leap_model"], "4000 Si X");
    assert_eq!(body["collection"]["evaporation_mode"], "laser");
    assert_eq!(body["preparation"]["preparation_method"], "electropolish");

    create_sample(&app, &name).await;
    let (_, body) = send(&app, get(&uri)).await;
    assert_eq!(body["information"]["sample_name"], "Sample2");
}

#[tokio::test]
async fn test_create_and_view_sample() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;

    let (status, body) = send(&app, get(&format!("/api/datasets/{name}/samples/Sample1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["information"]["sample_title"], "Example Sample");
    assert_eq!(body["collection"]["laser_pulse_energy"], 30.0);
    assert_eq!(body["rhit_files"][0]["name"], "EXAMPLE.RHIT");
    assert_eq!(body["rhit_files"][0]["size_bytes"], 21);
    assert!(body.get("errors").is_none());

    let (_, body) = send(&app, get(&format!("/api/datasets/{name}"))).await;
    assert_eq!(body["samples"][0]["name"], "Sample1");
    assert_eq!(body["samples"][0]["title"], "Example Sample");
}

#[tokio::test]
async fn test_duplicate_sample_conflicts() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;

    let (status, body) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples"),
            Some(&sample_metadata("Sample1")),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_sample_rejects_wrong_file_type_before_writing() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples"),
            Some(&sample_metadata("Sample1")),
            &[("rhit_file", "notes.txt", "not raw data")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get(&format!("/api/datasets/{name}/samples/Sample1"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sample_requires_metadata_part() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let (status, body) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples"),
            None,
            &[("rhit_file", "EXAMPLE.RHIT", "raw")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_invalid_sample_name() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let (status, body) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples"),
            Some(&sample_metadata("bad name")),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["error"]["errors"].as_array().unwrap();
    assert!(errors[0]
        .as_str()
        .unwrap()
        .contains("can only contain word characters"));
}

#[tokio::test]
async fn test_update_sample_documents() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;
    let base = format!("/api/datasets/{name}/samples/Sample1");

    let collection = json!({"evaporation_mode": "voltage", "voltage_ratio": 0.2});
    let (status, _) = send(
        &app,
        json_request("PUT", &format!("{base}/collection"), &collection),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let bad = json!({"evaporation_mode": "voltage", "voltage_ratio": -1.0});
    let (status, body) = send(&app, json_request("PUT", &format!("{base}/collection"), &bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"]["errors"][0],
        "voltage_ratio: Voltage ratio must be positive"
    );

    let preparation = json!({
        "preparation_method": "fib_lift_out",
        "fib_lift_out": {"lift_out_step": {"capping_material": "Pt"}}
    });
    let (status, _) = send(
        &app,
        json_request("PUT", &format!("{base}/preparation"), &preparation),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get(&base)).await;
    assert_eq!(body["collection"]["evaporation_mode"], "voltage");
    assert_eq!(body["preparation"]["preparation_method"], "fib_lift_out");
    assert!(body["preparation"].get("electropolish").is_none());
}

#[tokio::test]
async fn test_sample_information_cannot_rename() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;

    let mut info = sample_metadata("Sample7")["information"].clone();
    info["sample_title"] = json!("Another title");
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/datasets/{name}/samples/Sample1/information"),
            &info,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rhit_later() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;
    let uri = format!("/api/datasets/{name}/samples/Sample1/rhit");

    let (status, body) = send(
        &app,
        multipart_request(&uri, None, &[("rhit_file", "second.rhit", "abc")]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["sha256"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    // Same name again
    let (status, _) = send(
        &app,
        multipart_request(&uri, None, &[("rhit_file", "second.rhit", "xyz")]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Reconstructions and analyses
// =============================================================================

#[tokio::test]
async fn test_reconstruction_and_analysis_flow() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;
    let sample_uri = format!("/api/datasets/{name}/samples/Sample1");

    let recon = json!({
        "name": "Recon1",
        "metadata": {
            "title": "Reconstruction 1",
            "reconstruction_method": "shank_angle",
            "tip_radius": 50.0,
            "shank_angle": 15.0
        }
    });
    let (status, body) = send(
        &app,
        multipart_request(
            &format!("{sample_uri}/reconstructions"),
            Some(&recon),
            &[
                ("pos_file", "R5076.POS", "positions"),
                ("rrng_file", "ranges.RRNG", "ranges"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["pos_files"][0]["name"], "R5076.POS");
    assert_eq!(body["rrng_files"][0]["name"], "ranges.RRNG");
    assert!(body["tip_images"].as_array().unwrap().is_empty());

    let recon_uri = format!("{sample_uri}/reconstructions/Recon1");
    let updated = json!({"title": "Reconstruction 1", "reconstruction_method": "voltage_profile"});
    let (status, body) = send(&app, json_request("PUT", &recon_uri, &updated)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["reconstruction_method"], "voltage_profile");

    let analysis = json!({
        "folder_name": "Mass_Spectrum",
        "metadata": {"title": "Mass Spectrum", "description": "Spectrum of the mass to charge ratio"}
    });
    let (status, body) = send(
        &app,
        multipart_request(
            &format!("{recon_uri}/analyses"),
            Some(&analysis),
            &[("files", "spectrum.csv", "1,2\n"), ("files", "spectrum.png", "png")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get(&format!("{recon_uri}/analyses/Mass_Spectrum"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["title"], "Mass Spectrum");
    assert_eq!(body["files"][0]["name"], "spectrum.csv");

    let (_, body) = send(&app, get(&recon_uri)).await;
    assert_eq!(body["analyses"], json!(["Mass_Spectrum"]));
}

#[tokio::test]
async fn test_rejected_analysis_upload_leaves_nothing_behind() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;
    let recon_uri = format!("/api/datasets/{name}/samples/Sample1/reconstructions/Recon1");
    let recon = json!({"name": "Recon1", "metadata": {"title": "Reconstruction 1"}});
    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples/Sample1/reconstructions"),
            Some(&recon),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let analysis = json!({"folder_name": "Mass_Spectrum", "metadata": {"title": "Mass Spectrum"}});
    let analyses_uri = format!("{recon_uri}/analyses");

    let (status, _) = send(
        &app,
        multipart_request(
            &analyses_uri,
            Some(&analysis),
            &[("files", "a.csv", "1"), ("files", "a.csv", "2")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart_request(
            &analyses_uri,
            Some(&analysis),
            &[("files", "AnalysisMetadata.yaml", "title: x")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get(&format!("{analyses_uri}/Mass_Spectrum"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Retrying with a valid request works
    let (status, body) = send(
        &app,
        multipart_request(&analyses_uri, Some(&analysis), &[("files", "a.csv", "1")]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["files"][0]["name"], "a.csv");
    assert_eq!(std::fs::read_dir(tmp.path().join(".uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_reconstruction_for_missing_sample() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let recon = json!({"name": "Recon1", "metadata": {"title": "Reconstruction 1"}});
    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples/Sample9/reconstructions"),
            Some(&recon),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Publication
// =============================================================================

fn publication_request() -> Value {
    json!({
        "accept_license": true,
        "contact_person": "Logan Ward",
        "contact_email": "lward@example.org"
    })
}

#[tokio::test]
async fn test_publish_requires_license() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;

    let mut request = publication_request();
    request["accept_license"] = json!(false);
    let (status, body) = send(
        &app,
        json_request("POST", &format!("/api/datasets/{name}/publish"), &request),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("accept_license"));

    let (_, body) = send(&app, get(&format!("/api/datasets/{name}"))).await;
    assert_eq!(body["published"], false);
}

#[tokio::test]
async fn test_published_dataset_is_locked() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());
    let name = create_dataset(&app).await;
    create_sample(&app, &name).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/datasets/{name}/publish"),
            &publication_request(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["published"], true);
    assert_eq!(body["publication"]["metadata"]["dc.publisher"], "Materials Data Facility");
    assert!(body["metadata"]["dates"]["publication_date"].is_string());

    // Every mutating route answers 409
    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/api/datasets/{name}"), &dataset_form()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PUBLISHED");
    assert_eq!(body["error"]["message"], "Dataset has already been published!");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/datasets/{name}/publish"),
            &publication_request(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples"),
            Some(&sample_metadata("Sample2")),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, get(&format!("/api/datasets/{name}/samples/defaults"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/datasets/{name}/samples/Sample1/rhit"),
            None,
            &[("rhit_file", "late.RHIT", "late")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Reads keep working
    let (status, _) = send(&app, get(&format!("/api/datasets/{name}/samples/Sample1"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get(&format!("/api/datasets/{name}"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_lock_on_missing_dataset_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let app = setup_app(tmp.path());

    let (status, _) = send(
        &app,
        json_request("PUT", "/api/datasets/bogus", &dataset_form()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
