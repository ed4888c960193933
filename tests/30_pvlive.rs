mod common;

use anyhow::Result;
use axum::http::StatusCode;
use std::collections::HashSet;

use common::{is_ascending, times, TestApp, GSP};

#[tokio::test]
async fn all_gsps_without_regime_has_one_entry_per_gsp() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/pvlive/all", GSP)).await?;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    let gsp_ids: HashSet<i64> = entries.iter().map(|e| e["gspId"].as_i64().unwrap()).collect();
    assert_eq!(entries.len(), 10);
    assert_eq!(gsp_ids.len(), 10);

    for entry in entries {
        let yields = entry["gspYields"].as_array().unwrap();
        assert!(!yields.is_empty());
        // One yield per timestamp, strictly ascending
        assert!(is_ascending(&times(yields, "datetimeUtc")));
        assert!(yields.iter().all(|y| y["gspId"] == entry["gspId"]));
    }
    Ok(())
}

#[tokio::test]
async fn latest_regime_prefers_day_after_revisions() -> Result<()> {
    let app = TestApp::new();
    let (_, latest) = app.get_json(&format!("{}/5/pvlive", GSP)).await?;
    let (_, in_day) = app.get_json(&format!("{}/5/pvlive?regime=in-day", GSP)).await?;
    let (_, day_after) = app.get_json(&format!("{}/5/pvlive?regime=day-after", GSP)).await?;

    let latest = latest.as_array().unwrap();
    let in_day = in_day.as_array().unwrap();
    let day_after = day_after.as_array().unwrap();

    assert!(in_day.iter().all(|y| y["regime"] == "in-day"));
    assert!(day_after.iter().all(|y| y["regime"] == "day-after"));
    assert_eq!(latest.len(), in_day.len());
    for revised in day_after {
        assert!(latest.contains(revised));
    }
    Ok(())
}

#[tokio::test]
async fn regime_filter_applies_to_all_gsps() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/pvlive/all?regime=day-after", GSP)).await?;
    assert_eq!(status, StatusCode::OK);

    for entry in body.as_array().unwrap() {
        assert!(entry["gspYields"]
            .as_array()
            .unwrap()
            .iter()
            .all(|y| y["regime"] == "day-after"));
    }
    Ok(())
}

#[tokio::test]
async fn unknown_regime_is_unprocessable() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/pvlive/all?regime=yesterday", GSP)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");

    let (status, _) = app.get_json(&format!("{}/x/pvlive", GSP)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn unknown_gsp_has_no_yields() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/400/pvlive", GSP)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn deprecated_route_matches_canonical_bytes() -> Result<()> {
    let app = TestApp::new();
    for query in ["", "?regime=in-day"] {
        let (_, canonical) = app.get(&format!("{}/7/pvlive{}", GSP, query)).await?;
        let (status, alias) = app.get(&format!("{}/pvlive/7{}", GSP, query)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(canonical, alias);
    }
    Ok(())
}
