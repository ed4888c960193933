mod common;

use anyhow::Result;
use axum::http::StatusCode;

use common::{is_ascending, times, TestApp, GSP};

#[tokio::test]
async fn all_forecasts_default_to_historic_and_are_normalized() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/forecast/all", GSP)).await?;
    assert_eq!(status, StatusCode::OK);

    let forecasts = body["forecasts"].as_array().expect("forecasts");
    assert_eq!(forecasts.len(), 10);

    let gsp_ids: Vec<i64> = forecasts.iter().map(|f| f["location"]["gspId"].as_i64().unwrap()).collect();
    assert_eq!(gsp_ids, (0..10).collect::<Vec<i64>>());

    for forecast in forecasts {
        assert_eq!(forecast["historic"], true);
        let capacity = forecast["location"]["installedCapacityMw"].as_f64().unwrap();
        let values = forecast["forecastValues"].as_array().unwrap();
        assert!(is_ascending(&times(values, "targetTime")));
        for value in values {
            let mw = value["expectedPowerGenerationMegawatts"].as_f64().unwrap();
            let normalized = value["expectedPowerGenerationNormalized"].as_f64().unwrap();
            assert!((normalized - mw / capacity).abs() < 1e-9);
        }
    }
    Ok(())
}

#[tokio::test]
async fn historic_forecasts_are_a_superset_of_todays() -> Result<()> {
    let app = TestApp::new();
    let (_, historic) = app.get_json(&format!("{}/forecast/all?historic=true", GSP)).await?;
    let (status, today) = app.get_json(&format!("{}/forecast/all?historic=false", GSP)).await?;
    assert_eq!(status, StatusCode::OK);

    let historic = historic["forecasts"].as_array().unwrap();
    let today = today["forecasts"].as_array().unwrap();
    assert_eq!(historic.len(), today.len());

    for (h, t) in historic.iter().zip(today) {
        assert_eq!(h["location"], t["location"]);
        assert_eq!(t["historic"], false);
        let h_values = h["forecastValues"].as_array().unwrap();
        for value in t["forecastValues"].as_array().unwrap() {
            assert!(h_values.contains(value));
        }
    }
    Ok(())
}

#[tokio::test]
async fn gsp_forecast_without_horizon_is_a_full_forecast() -> Result<()> {
    let app = TestApp::new();
    for gsp_id in [0, 4, 9] {
        let (status, body) = app.get_json(&format!("{}/{}/forecast", GSP, gsp_id)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["gspId"], gsp_id);
        assert_eq!(body["modelName"], "fake-cnn");

        let values = body["forecastValues"].as_array().unwrap();
        assert!(!values.is_empty());
        assert!(is_ascending(&times(values, "targetTime")));
    }
    Ok(())
}

#[tokio::test]
async fn gsp_forecast_with_horizon_is_a_value_list() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .get_json(&format!("{}/3/forecast?forecast_horizon_minutes=120", GSP))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let values = body.as_array().expect("bare list of forecast values");
    assert!(!values.is_empty());
    assert!(is_ascending(&times(values, "targetTime")));
    Ok(())
}

#[tokio::test]
async fn longer_horizons_pick_older_runs() -> Result<()> {
    let app = TestApp::new();
    let (_, latest) = app.get_json(&format!("{}/3/forecast?forecast_horizon_minutes=0", GSP)).await?;
    let (_, early) = app.get_json(&format!("{}/3/forecast?forecast_horizon_minutes=360", GSP)).await?;

    // Later runs carry a larger offset, so earlier runs never produce larger values
    for value in early.as_array().unwrap() {
        let matching = latest
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["targetTime"] == value["targetTime"])
            .expect("every early target is also forecast by the latest run");
        let mw = |v: &serde_json::Value| v["expectedPowerGenerationMegawatts"].as_f64().unwrap();
        assert!(mw(value) <= mw(matching));
    }
    Ok(())
}

#[tokio::test]
async fn unknown_gsp_returns_empty_list() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get_json(&format!("{}/250/forecast", GSP)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn invalid_parameters_are_unprocessable() -> Result<()> {
    let app = TestApp::new();
    for uri in [
        format!("{}/abc/forecast", GSP),
        format!("{}/1/forecast?forecast_horizon_minutes=soon", GSP),
        format!("{}/1/forecast?forecast_horizon_minutes=-30", GSP),
        format!("{}/forecast/all?historic=maybe", GSP),
    ] {
        let (status, body) = app.get_json(&uri).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");
    }
    Ok(())
}

#[tokio::test]
async fn deprecated_route_matches_canonical_bytes() -> Result<()> {
    let app = TestApp::new();
    for query in ["", "?forecast_horizon_minutes=60"] {
        let (s1, canonical) = app.get(&format!("{}/2/forecast{}", GSP, query)).await?;
        let (s2, alias) = app.get(&format!("{}/forecast/2{}", GSP, query)).await?;
        assert_eq!(s1, StatusCode::OK);
        assert_eq!(s2, StatusCode::OK);
        assert_eq!(canonical, alias);
    }
    Ok(())
}

#[tokio::test]
async fn historic_flag_accepts_python_style_booleans() -> Result<()> {
    let app = TestApp::new();
    let (_, canonical_true) = app.get_json(&format!("{}/forecast/all?historic=true", GSP)).await?;
    let (_, canonical_false) = app.get_json(&format!("{}/forecast/all?historic=false", GSP)).await?;

    for (raw, expected) in [
        ("True", &canonical_true),
        ("1", &canonical_true),
        ("yes", &canonical_true),
        ("on", &canonical_true),
        ("False", &canonical_false),
        ("0", &canonical_false),
        ("no", &canonical_false),
        ("off", &canonical_false),
    ] {
        let (status, body) = app.get_json(&format!("{}/forecast/all?historic={}", GSP, raw)).await?;
        assert_eq!(status, StatusCode::OK, "historic={}", raw);
        assert_eq!(&body, expected, "historic={}", raw);
    }
    Ok(())
}
