use poem::http::StatusCode;
use poem::web::{Data, Json};
use poem::{handler, Body, IntoResponse, Request, Response};
use serde_json::Value;

use crate::model::Classifier;
use crate::prelude::*;
use crate::web::responses::{error_response, PredictionBody};

const FEATURES_KEY: &str = "features";

#[handler]
#[instrument(level = "info", skip_all)]
pub async fn post_predict(
    request: &Request,
    body: Body,
    Data(classifier): Data<&Arc<Classifier>>,
) -> poem::Result<Response> {
    if !request.content_type().map_or(false, is_json) {
        return Ok(bad_request("Request must be JSON"));
    }
    let body = match serde_json::from_slice::<Value>(&body.into_bytes().await?) {
        Ok(body) => body,
        Err(error) => {
            debug!("{:#}", error);
            return Ok(bad_request("Request must be JSON"));
        }
    };

    let features = match body.get(FEATURES_KEY) {
        Some(Value::Array(features)) => features,
        Some(_) => {
            return Ok(bad_request(format!("'{}' must be an array", FEATURES_KEY)));
        }
        None => {
            return Ok(bad_request(format!("Missing '{}' key in JSON body", FEATURES_KEY)));
        }
    };
    if features.len() != classifier.n_features() {
        return Ok(bad_request(format!(
            "Expected {} features, got {}",
            classifier.n_features(),
            features.len(),
        )));
    }

    match predict(classifier, features) {
        Ok(prediction) => {
            info!(prediction, "predicted");
            Ok(Json(PredictionBody { prediction }).into_response())
        }
        Err(error) => {
            error!("{:#}", error);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error during prediction: {:#}", error),
            ))
        }
    }
}

fn predict(classifier: &Classifier, features: &[Value]) -> Result<usize> {
    let features = features
        .iter()
        .map(|value| value.as_f64().ok_or_else(|| anyhow!("could not convert {} to float", value)))
        .collect::<Result<Vec<f64>>>()?;
    classifier.predict_one(&features)
}

fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    info!(message = message.as_str(), "bad request");
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Accepts `application/json` and the `application/*+json` family, ignoring parameters.
fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use poem::test::TestClient;
    use serde_json::json;

    use super::*;
    use crate::trainer::dataset;
    use crate::web::create_app;
    use crate::web::test::{create_standalone_test_client, fit_test_classifier};

    #[tokio::test]
    async fn setosa_ok() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": [5.1, 3.5, 1.4, 0.2]}))
            .send()
            .await;
        response.assert_status_is_ok();
        response.assert_header("X-Content-Type-Options", "nosniff");
        response.assert_json(json!({"prediction": 0})).await;
        Ok(())
    }

    #[tokio::test]
    async fn every_record_ok() -> Result {
        let client = create_standalone_test_client()?;
        for record in dataset::load().records().rows() {
            let response = client
                .post("/predict")
                .body_json(&json!({ "features": record.to_vec() }))
                .send()
                .await;
            response.assert_status_is_ok();
            let body: Value = response
                .0
                .into_body()
                .into_json()
                .await
                .map_err(|error| anyhow!("{}", error))?;
            let prediction = body["prediction"]
                .as_u64()
                .ok_or_else(|| anyhow!("no prediction in {}", body))?;
            assert!(prediction <= 2, "prediction: {}", prediction);
        }
        Ok(())
    }

    #[tokio::test]
    async fn integer_features_ok() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": [5, 3, 1, 0]}))
            .send()
            .await;
        response.assert_status_is_ok();
        Ok(())
    }

    #[tokio::test]
    async fn huge_features_ok() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": [1e308, 1e308, 1e308, 1e308]}))
            .send()
            .await;
        response.assert_status_is_ok();
        let body = response.0.into_body().into_json::<Value>().await;
        let body = body.map_err(|error| anyhow!("{}", error))?;
        let prediction = body["prediction"]
            .as_u64()
            .ok_or_else(|| anyhow!("no prediction in {}", body))?;
        assert!(prediction <= 2, "prediction: {}", prediction);
        Ok(())
    }

    #[tokio::test]
    async fn not_json_content_type() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .content_type("text/plain")
            .body(r#"{"features": [5.1, 3.5, 1.4, 0.2]}"#)
            .send()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(json!({"error": "Request must be JSON"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .content_type("application/json")
            .body(r#"{"features": [5.1, 3.5"#)
            .send()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(json!({"error": "Request must be JSON"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_features_key() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"values": [5.1, 3.5, 1.4, 0.2]}))
            .send()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response
            .assert_json(json!({"error": "Missing 'features' key in JSON body"}))
            .await;
        Ok(())
    }

    #[tokio::test]
    async fn features_not_array() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": "5.1, 3.5, 1.4, 0.2"}))
            .send()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(json!({"error": "'features' must be an array"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn wrong_feature_count() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": [5.1, 3.5, 1.4]}))
            .send()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(json!({"error": "Expected 4 features, got 3"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn non_numeric_feature() -> Result {
        let client = create_standalone_test_client()?;
        let response = client
            .post("/predict")
            .body_json(&json!({"features": [5.1, "a", 1.4, 0.2]}))
            .send()
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response
            .assert_json(json!({
                "error": r#"Error during prediction: could not convert "a" to float"#,
            }))
            .await;
        Ok(())
    }

    #[tokio::test]
    async fn method_not_allowed() -> Result {
        let client = create_standalone_test_client()?;
        let response = client.get("/predict").send().await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        response.assert_json(json!({"error": "Method not allowed"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn not_found() -> Result {
        let client = create_standalone_test_client()?;
        let response = client.post("/health").send().await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(json!({"error": "Not found"})).await;
        Ok(())
    }

    #[tokio::test]
    async fn reloaded_model_ok() -> Result {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("iris_model.pickle");
        fit_test_classifier()?.save(&path)?;

        let request = json!({"features": [6.3, 2.8, 5.1, 1.5]});
        let mut predictions = Vec::new();
        for _ in 0..2 {
            let client = TestClient::new(create_app(Arc::new(Classifier::load(&path)?), false));
            let response = client.post("/predict").body_json(&request).send().await;
            response.assert_status_is_ok();
            let body = response.0.into_body().into_json::<Value>().await;
            predictions.push(body.map_err(|error| anyhow!("{}", error))?);
        }
        assert_eq!(predictions[0], predictions[1]);
        Ok(())
    }

    #[test]
    fn is_json_ok() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json("application/x-www-form-urlencoded"));
    }
}
