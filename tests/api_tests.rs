// HTTP tests for RakhtSetu, run against in-memory storage

mod common;

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use common::{StalledDonors, UnreachableDonors};
use rakht_setu::config::MatchingSettings;
use rakht_setu::models::{BloodGroup, BloodRequest, Donor, GeoPoint, RequestStatus, Urgency};
use rakht_setu::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use rakht_setu::services::{
    BroadcastWorker, DonorRepository, InMemoryRepository, LogGateway, NotificationDispatcher,
    RequestRepository,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn state_from(
    donors: Arc<dyn DonorRepository>,
    repo: Arc<InMemoryRepository>,
    matching: &MatchingSettings,
) -> (AppState, BroadcastWorker) {
    let dispatcher = Arc::new(NotificationDispatcher::new(Arc::new(LogGateway), None));
    AppState::new(donors, repo.clone(), repo, dispatcher, matching, 64, "memory")
}

fn state_with(repo: Arc<InMemoryRepository>) -> AppState {
    let (state, _worker) = state_from(repo.clone(), repo, &MatchingSettings::default());
    state
}

fn north_of(origin: &GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(origin.latitude() + km / 111.195, origin.longitude()).unwrap()
}

fn center() -> GeoPoint {
    GeoPoint::new(17.3850, 78.4867).unwrap()
}

fn donor(name: &str, group: BloodGroup, location: GeoPoint) -> Donor {
    let now = Utc::now();
    Donor {
        id: Uuid::new_v4(),
        full_name: name.to_string(),
        email: None,
        phone: "9000000300".to_string(),
        blood_group: group,
        location: location.into(),
        availability: true,
        last_donation_date: None,
        donation_count: 0,
        medical_history: vec![],
        is_verified: false,
        created_at: now,
        updated_at: now,
        removed_at: None,
    }
}

fn blood_request(location: GeoPoint) -> BloodRequest {
    let now = Utc::now();
    BloodRequest {
        id: Uuid::new_v4(),
        requester_name: "Zoya".to_string(),
        requester_phone: "9000000301".to_string(),
        blood_group: BloodGroup::BNegative,
        units_required: 1,
        hospital_name: "Osmania".to_string(),
        hospital_address: "Afzal Gunj".to_string(),
        location: location.into(),
        urgency: Urgency::Medium,
        status: RequestStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_create_request_returns_created_with_lat_lng_location() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .set_json(json!({
            "requesterName": "Zoya",
            "requesterPhone": "9000000301",
            "bloodGroup": "O-",
            "unitsRequired": 2,
            "hospitalName": "Osmania",
            "hospitalAddress": "Afzal Gunj",
            "latitude": 17.385,
            "longitude": 78.4867,
            "urgency": "Critical"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["bloodGroup"], "O-");
    assert_eq!(body["location"]["latitude"], 17.385);
    assert_eq!(body["location"]["longitude"], 78.4867);

    let stored = state.requests.list_requests().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].location.coordinates, [78.4867, 17.385]);
}

#[actix_web::test]
async fn test_create_request_without_location_is_rejected() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .set_json(json!({
            "requesterName": "Zoya",
            "requesterPhone": "9000000301",
            "bloodGroup": "A+",
            "unitsRequired": 1,
            "hospitalName": "Osmania",
            "hospitalAddress": "Afzal Gunj"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["status_code"], 400);
    assert!(state.requests.list_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_request_rejects_zero_units_and_unknown_group() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    let zero_units = test::TestRequest::post()
        .uri("/api/v1/requests")
        .set_json(json!({
            "requesterName": "Zoya",
            "requesterPhone": "9000000301",
            "bloodGroup": "A+",
            "unitsRequired": 0,
            "hospitalName": "Osmania",
            "hospitalAddress": "Afzal Gunj",
            "latitude": 17.385,
            "longitude": 78.4867
        }))
        .to_request();
    assert_eq!(test::call_service(&app, zero_units).await.status(), StatusCode::BAD_REQUEST);

    let unknown_group = test::TestRequest::post()
        .uri("/api/v1/requests")
        .set_json(json!({
            "requesterName": "Zoya",
            "requesterPhone": "9000000301",
            "bloodGroup": "C+",
            "unitsRequired": 1,
            "hospitalName": "Osmania",
            "hospitalAddress": "Afzal Gunj",
            "latitude": 17.385,
            "longitude": 78.4867
        }))
        .to_request();
    assert_eq!(test::call_service(&app, unknown_group).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_nearby_donors_default_radius_and_order() {
    let repo = Arc::new(InMemoryRepository::new());
    let origin = center();
    repo.insert_donor(donor("Three", BloodGroup::OPositive, north_of(&origin, 3.0))).await.unwrap();
    repo.insert_donor(donor("One", BloodGroup::BPositive, north_of(&origin, 1.0))).await.unwrap();
    repo.insert_donor(donor("Fifteen", BloodGroup::OPositive, north_of(&origin, 15.0))).await.unwrap();

    let state = state_with(repo);
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(names(&body), vec!["One".to_string(), "Three".to_string()]);

    let distance = body[0]["distance"].as_str().unwrap();
    assert!(distance.ends_with(" km"));
    let number = distance.trim_end_matches(" km");
    assert_eq!(number.split('.').nth(1).map(str::len), Some(2));

    // An explicit radius widens the search
    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867&radius=20")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_nearby_donors_exact_versus_compatible_group() {
    let repo = Arc::new(InMemoryRepository::new());
    let origin = center();
    repo.insert_donor(donor("Universal", BloodGroup::ONegative, north_of(&origin, 2.0))).await.unwrap();
    repo.insert_donor(donor("Same", BloodGroup::APositive, north_of(&origin, 4.0))).await.unwrap();
    repo.insert_donor(donor("Other", BloodGroup::BPositive, north_of(&origin, 1.0))).await.unwrap();

    let state = state_with(repo);
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867&bloodGroup=A%2B")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(names(&body), vec!["Same".to_string()]);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867&bloodGroup=A%2B&compatible=true")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(names(&body), vec!["Universal".to_string(), "Same".to_string()]);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867&bloodGroup=All")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_nearby_donors_rejects_bad_input() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    for uri in [
        "/api/v1/donors/nearby?lng=78.4867",
        "/api/v1/donors/nearby?lat=95&lng=78.4867",
        "/api/v1/donors/nearby?lat=abc&lng=78.4867",
        "/api/v1/donors/nearby?lat=17.385&lng=78.4867&radius=0",
        "/api/v1/donors/nearby?lat=17.385&lng=78.4867&radius=5000",
        "/api/v1/donors/nearby?lat=17.385&lng=78.4867&bloodGroup=Q",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[actix_web::test]
async fn test_nearby_requests_excludes_completed_and_formats_distance() {
    let repo = Arc::new(InMemoryRepository::new());
    let origin = center();
    let open = repo.insert_request(blood_request(north_of(&origin, 3.2))).await.unwrap();
    let done = repo.insert_request(blood_request(north_of(&origin, 1.0))).await.unwrap();
    repo.update_status(done.id, RequestStatus::Completed).await.unwrap();
    repo.insert_request(blood_request(north_of(&origin, 60.0))).await.unwrap();

    let state = state_with(repo);
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/requests/nearby?lat=17.385&lng=78.4867")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], open.id.to_string());
    assert_eq!(items[0]["distance"], "3.2 km");
    assert!(items[0]["location"]["latitude"].is_number());
}

#[actix_web::test]
async fn test_request_status_moves_forward_only() {
    let repo = Arc::new(InMemoryRepository::new());
    let stored = repo.insert_request(blood_request(center())).await.unwrap();
    let state = state_with(repo);
    let app = test_app!(state);
    let uri = format!("/api/v1/requests/{}", stored.id);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({ "status": "completed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({ "status": "pending" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({ "status": "cancelled" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("{}/broadcast", uri))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_unknown_ids_are_not_found() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    for uri in [
        format!("/api/v1/requests/{}", Uuid::new_v4()),
        format!("/api/v1/donors/{}", Uuid::new_v4()),
        "/api/v1/donors/not-a-uuid".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn test_donor_lifecycle() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/donors")
        .set_json(json!({
            "fullName": "Vikram",
            "email": "vikram@example.com",
            "phone": "9000000302",
            "bloodGroup": "O+",
            "latitude": "17.39",
            "longitude": "78.49"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["availability"], true);
    assert_eq!(body["eligible"], true);
    let id = body["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/donors/{}/donations", id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["donationCount"], 1);
    assert_eq!(body["eligible"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/filter?bloodGroup=O%2B&eligible=false")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/donors/{}/availability", id))
        .set_json(json!({ "availability": false }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.39&lng=78.49")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body.as_array().unwrap().is_empty());

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/donors/{}/verify", id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["isVerified"], true);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/donors/{}", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/donors/{}", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_match_preview_uses_compatibility() {
    let repo = Arc::new(InMemoryRepository::new());
    let origin = center();
    repo.insert_donor(donor("Bneg", BloodGroup::BNegative, north_of(&origin, 2.0))).await.unwrap();
    repo.insert_donor(donor("Oneg", BloodGroup::ONegative, north_of(&origin, 1.0))).await.unwrap();
    repo.insert_donor(donor("Bpos", BloodGroup::BPositive, north_of(&origin, 0.5))).await.unwrap();
    let request = repo.insert_request(blood_request(origin)).await.unwrap();

    let state = state_with(repo);
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{}/matches", request.id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

    assert_eq!(body["totalMatches"], 2);
    assert_eq!(body["radiusKm"], 10.0);
    assert_eq!(body["matches"][0]["name"], "Oneg");
    assert_eq!(body["matches"][1]["name"], "Bneg");
}

#[actix_web::test]
async fn test_health_reports_storage() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_donor_lookup_failure_is_service_unavailable() {
    let repo = Arc::new(InMemoryRepository::new());
    let request = repo.insert_request(blood_request(center())).await.unwrap();
    let (state, _worker) = state_from(Arc::new(UnreachableDonors), repo, &MatchingSettings::default());
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "service_unavailable");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{}/matches", request.id))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[actix_web::test]
async fn test_stalled_donor_lookup_times_out() {
    let matching = MatchingSettings {
        lookup_timeout_secs: 1,
        ..MatchingSettings::default()
    };
    let (state, _worker) = state_from(
        Arc::new(StalledDonors),
        Arc::new(InMemoryRepository::new()),
        &matching,
    );
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?lat=17.385&lng=78.4867")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[actix_web::test]
async fn test_create_request_succeeds_when_broadcast_lookup_fails() {
    let repo = Arc::new(InMemoryRepository::new());
    let (state, worker) = state_from(Arc::new(UnreachableDonors), repo.clone(), &MatchingSettings::default());
    worker.spawn();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .set_json(json!({
            "requesterName": "Zoya",
            "requesterPhone": "9000000301",
            "bloodGroup": "A+",
            "unitsRequired": 1,
            "hospitalName": "Osmania",
            "hospitalAddress": "Afzal Gunj",
            "latitude": 17.385,
            "longitude": 78.4867
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(repo.get_request(id).await.unwrap().status, RequestStatus::Pending);
}

#[actix_web::test]
async fn test_donor_updates_do_not_overwrite_each_other() {
    let repo = Arc::new(InMemoryRepository::new());
    let stored = repo
        .insert_donor(donor("Tara", BloodGroup::AbNegative, center()))
        .await
        .unwrap();
    let state = state_with(repo.clone());
    let app = test_app!(state);

    let location = test::TestRequest::patch()
        .uri(&format!("/api/v1/donors/{}/location", stored.id))
        .set_json(json!({ "latitude": 17.44, "longitude": 78.35 }))
        .to_request();
    let availability = test::TestRequest::patch()
        .uri(&format!("/api/v1/donors/{}/availability", stored.id))
        .set_json(json!({ "availability": false }))
        .to_request();
    let first_donation = test::TestRequest::post()
        .uri(&format!("/api/v1/donors/{}/donations", stored.id))
        .to_request();
    let second_donation = test::TestRequest::post()
        .uri(&format!("/api/v1/donors/{}/donations", stored.id))
        .to_request();

    let (a, b, c, d) = tokio::join!(
        test::call_service(&app, location),
        test::call_service(&app, availability),
        test::call_service(&app, first_donation),
        test::call_service(&app, second_donation),
    );
    for resp in [a, b, c, d] {
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let current = repo.get_donor(stored.id).await.unwrap();
    assert_eq!(current.donation_count, 2);
    assert!(!current.availability);
    assert_eq!(current.location.coordinates, [78.35, 17.44]);
}

fn campaign_body(title: &str, city: &str, date: chrono::NaiveDate, kind: &str) -> Value {
    json!({
        "title": title,
        "description": "Walk-in blood donation",
        "city": city,
        "address": "Main Road",
        "latitude": 17.42,
        "longitude": 78.47,
        "date": date.format("%Y-%m-%d").to_string(),
        "time": "09:00 AM - 05:00 PM",
        "organizer": "NSS",
        "type": kind
    })
}

#[actix_web::test]
async fn test_campaign_lifecycle_and_filters() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);
    let today = Utc::now().date_naive();

    let mut ids = Vec::new();
    for body in [
        campaign_body("Next week", "Hyderabad", today + Duration::days(7), "Blood Drive"),
        campaign_body("Today", "Secunderabad", today, "Emergency Camp"),
        campaign_body("Last month", "Pune", today - Duration::days(30), "Awareness"),
    ] {
        let req = test::TestRequest::post().uri("/api/v1/campaigns").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::get().uri("/api/v1/campaigns").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let titles: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Last month", "Today", "Next week"]);
    let statuses: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["Completed", "Ongoing", "Upcoming"]);
    assert_eq!(body[2]["bloodGroups"], json!(["All Groups"]));
    assert_eq!(body[2]["location"]["latitude"], 17.42);

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns?city=ABAD&status=All")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let titles: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Today", "Next week"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns?type=Emergency%20Camp&status=Ongoing")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Today");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/campaigns/{}", ids[0]))
        .set_json(json!({ "organizer": "Red Cross", "title": "", "bloodGroupsNeeded": ["O-"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["organizer"], "Red Cross");
    assert_eq!(body["title"], "Next week");
    assert_eq!(body["bloodGroups"], json!(["O-"]));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/campaigns/{}", ids[0]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/campaigns/{}", ids[0]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_campaign_rejects_bad_input() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let app = test_app!(state);
    let today = Utc::now().date_naive();

    let mut missing_location = campaign_body("Camp", "Pune", today, "Blood Drive");
    missing_location.as_object_mut().unwrap().remove("longitude");
    let req = test::TestRequest::post()
        .uri("/api/v1/campaigns")
        .set_json(missing_location)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/campaigns")
        .set_json(campaign_body("Camp", "Pune", today, "Concert"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns?status=cancelled")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
