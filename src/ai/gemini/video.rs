use super::client::GeminiHttpClient;
use crate::ai::VideoGenerationService;
use crate::error::ProviderFailure;
use crate::models::{
    GeneratedVideo, VideoAspectRatio, VideoGenerationRequest, VideoJob, VideoResolution,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct VideoRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    #[serde(skip_serializing_if = "String::is_empty")]
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<StartImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: VideoAspectRatio,
    resolution: VideoResolution,
    sample_count: u32,
}

/// Long-running operation envelope returned by submit and status calls.
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    code: Option<u16>,
    message: String,
}

impl Operation {
    fn into_job(self) -> Result<VideoJob> {
        if let Some(error) = self.error {
            tracing::error!("Video operation {} failed: {}", self.name, error.message);
            return Err(Error::Generation(ProviderFailure::new(
                error.code,
                error.message,
            )));
        }

        let result_uri = self
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);

        Ok(VideoJob {
            name: self.name,
            done: self.done,
            result_uri,
        })
    }
}

/// Veo client: submits jobs, reads their status, and downloads the result.
pub struct GeminiVideoClient {
    http: GeminiHttpClient,
}

impl GeminiVideoClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(300),
                client,
            ),
        }
    }
}

super::impl_with_gemini_base_url!(GeminiVideoClient);

#[async_trait]
impl VideoGenerationService for GeminiVideoClient {
    async fn submit(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
        let body = VideoRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt.clone(),
                image: request.start_image.as_ref().map(|image| StartImage {
                    bytes_base64_encoded: image.data.clone(),
                    mime_type: image.mime_type.clone(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio,
                resolution: request.resolution,
                sample_count: 1,
            },
        };

        let operation: Operation = self
            .http
            .predict_long_running(&body)
            .await
            .map_err(Error::into_generation)?;

        tracing::info!(
            "Submitted video job {} ({}, {}, start image: {})",
            operation.name,
            request.aspect_ratio,
            request.resolution,
            request.start_image.is_some()
        );

        operation.into_job()
    }

    async fn refresh(&self, job: &VideoJob) -> Result<VideoJob> {
        let operation: Operation = self
            .http
            .get_operation(&job.name)
            .await
            .map_err(Error::into_generation)?;

        operation.into_job()
    }

    async fn download(&self, uri: &str) -> Result<GeneratedVideo> {
        let (bytes, content_type) = self
            .http
            .download(uri)
            .await
            .map_err(Error::into_generation)?;

        let mime_type = content_type
            .filter(|ct| ct.starts_with("video/"))
            .unwrap_or_else(|| "video/mp4".to_string());

        Ok(GeneratedVideo { bytes, mime_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::ai::BinaryPayload;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "veo-3.1-fast-generate-preview";
    const OPERATION_NAME: &str = "models/veo-3.1-fast-generate-preview/operations/op123";

    fn make_client(server: &MockServer) -> GeminiVideoClient {
        GeminiVideoClient::new("key".to_string(), DEFAULT_MODEL.to_string())
            .with_base_url(server.uri())
    }

    fn request(start_image: Option<BinaryPayload>) -> VideoGenerationRequest {
        VideoGenerationRequest {
            prompt: "a neon hologram of a cat".to_string(),
            aspect_ratio: VideoAspectRatio::Portrait,
            resolution: VideoResolution::FullHd,
            start_image,
        }
    }

    #[tokio::test]
    async fn test_submit_passes_options_and_returns_running_job() {
        let server = MockServer::start().await;
        let image = BinaryPayload::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "image/png");

        test_support::post_path_regex(test_support::PREDICT_LONG_RUNNING_PATH_REGEX)
            .and(body_partial_json(serde_json::json!({
                "instances": [{
                    "prompt": "a neon hologram of a cat",
                    "image": { "bytesBase64Encoded": image.data, "mimeType": "image/png" }
                }],
                "parameters": { "aspectRatio": "9:16", "resolution": "1080p", "sampleCount": 1 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": OPERATION_NAME })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let job = make_client(&server)
            .submit(&request(Some(image.clone())))
            .await
            .unwrap();
        assert_eq!(job, VideoJob::running(OPERATION_NAME));
    }

    #[tokio::test]
    async fn test_every_ratio_and_resolution_is_passed_through() {
        for aspect_ratio in VideoAspectRatio::ALL {
            for resolution in VideoResolution::ALL {
                let server = MockServer::start().await;

                test_support::post_path_regex(test_support::PREDICT_LONG_RUNNING_PATH_REGEX)
                    .and(body_partial_json(serde_json::json!({
                        "parameters": {
                            "aspectRatio": aspect_ratio.as_str(),
                            "resolution": resolution.as_str()
                        }
                    })))
                    .respond_with(
                        ResponseTemplate::new(200)
                            .set_body_json(serde_json::json!({ "name": OPERATION_NAME })),
                    )
                    .expect(1)
                    .mount(&server)
                    .await;

                let request = VideoGenerationRequest {
                    aspect_ratio,
                    resolution,
                    ..request(None)
                };
                make_client(&server).submit(&request).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_extracts_result_uri() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1beta/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{ "video": { "uri": "https://files.example/v.mp4" } }]
                    }
                }
            })))
            .mount(&server)
            .await;

        let job = make_client(&server)
            .refresh(&VideoJob::running(OPERATION_NAME))
            .await
            .unwrap();
        assert_eq!(
            job,
            VideoJob::finished(OPERATION_NAME, Some("https://files.example/v.mp4".to_string()))
        );
    }

    #[tokio::test]
    async fn test_refresh_done_without_samples_has_no_locator() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1beta/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": { "generateVideoResponse": {} }
            })))
            .mount(&server)
            .await;

        let job = make_client(&server)
            .refresh(&VideoJob::running(OPERATION_NAME))
            .await
            .unwrap();
        assert!(job.done);
        assert!(job.result_uri.is_none());
    }

    #[tokio::test]
    async fn test_failed_operation_is_generation_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": true,
                "error": { "code": 3, "message": "prompt rejected" }
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .refresh(&VideoJob::running(OPERATION_NAME))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.to_string().contains("prompt rejected"));
    }

    #[tokio::test]
    async fn test_submit_with_unknown_key_is_credential_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::PREDICT_LONG_RUNNING_PATH_REGEX)
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": 404, "message": "Requested entity was not found." }
            })))
            .mount(&server)
            .await;

        let err = make_client(&server).submit(&request(None)).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.is_credential_invalid());
    }

    #[tokio::test]
    async fn test_download_returns_bytes_and_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/v.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0, 0, 0, 0x18, 0x66, 0x74, 0x79, 0x70], "video/mp4"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let video = make_client(&server)
            .download(&format!("{}/files/v.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.bytes.len(), 8);
    }
}
