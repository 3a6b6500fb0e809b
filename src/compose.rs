//! Natural-language response composition.
//!
//! When an LLM provider is configured, the composer sends the routed
//! function, its confidence and the concrete execution results to an
//! OpenAI-compatible chat-completions endpoint. Without a provider (or on
//! any generation failure or timeout) it falls back to a deterministic
//! template, so `/chat` always answers.

use crate::config::{Config, LlmProvider};
use crate::error::{AppError, Result};
use crate::executor::ExecutionResult;
use crate::router::RouteResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

const SYSTEM_PROMPT: &str = r#"Eres el asistente virtual de una panadería artesanal llamada "La Panadería".
Responde de forma natural, cálida y CONCRETA usando los datos del inventario que se te proporcionan.

REGLAS IMPORTANTES:
1. Usa los DATOS CONCRETOS proporcionados (precios exactos, stock real, horarios reales)
2. Sé específico: en vez de "tenemos varios panes", di "tenemos Pan Francés a $0.15 y Pan Integral a $0.25"
3. Menciona el stock disponible cuando sea relevante
4. Si es un pedido, calcula y menciona el total
5. Usa emojis ocasionalmente para ser amigable 🥐🍞
6. Si el cliente pregunta algo fuera de contexto, redirige amablemente a la panadería"#;

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Chat-completions client for OpenAI, Groq and Ollama, which all speak the
/// same request shape.
pub struct OpenAiCompatibleGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ResponseGenerator for OpenAiCompatibleGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": 0.7,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::GenerationError(format!("LLM request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::GenerationError(format!(
                "LLM returned status {}",
                response.status()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::GenerationError(format!("Malformed LLM response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::GenerationError("LLM response had no choices".into()))
    }
}

pub struct Composer {
    generator: Option<Box<dyn ResponseGenerator>>,
    timeout: Duration,
}

impl Composer {
    pub fn from_config(config: &Config) -> Self {
        let generator: Option<Box<dyn ResponseGenerator>> = match config.llm_provider {
            LlmProvider::None => {
                tracing::info!("No LLM provider configured, using template responses");
                None
            }
            provider => {
                tracing::info!(?provider, model = %config.llm_model, "LLM generator configured");
                Some(Box::new(OpenAiCompatibleGenerator::new(
                    config.llm_base_url.clone(),
                    config.llm_api_key.clone(),
                    config.llm_model.clone(),
                )))
            }
        };

        Self {
            generator,
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    pub fn with_generator(generator: Box<dyn ResponseGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    pub fn template_only() -> Self {
        Self {
            generator: None,
            timeout: Duration::from_secs(1),
        }
    }

    /// Compose the final reply. Generation failures are absorbed: the
    /// template answer goes out and the error is only logged.
    pub async fn respond(
        &self,
        query: &str,
        route: &RouteResult,
        exec_results: &HashMap<String, ExecutionResult>,
    ) -> String {
        let Some(generator) = &self.generator else {
            return template_response(route);
        };

        let user_prompt = build_user_prompt(query, route, exec_results);

        match tokio::time::timeout(self.timeout, generator.generate(SYSTEM_PROMPT, &user_prompt))
            .await
        {
            Ok(Ok(text)) => {
                tracing::info!(chars = text.len(), "LLM response generated");
                text
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "LLM generation failed, using template");
                template_response(route)
            }
            Err(_) => {
                tracing::error!(timeout_secs = self.timeout.as_secs(), "LLM generation timed out");
                template_response(route)
            }
        }
    }
}

fn build_user_prompt(
    query: &str,
    route: &RouteResult,
    exec_results: &HashMap<String, ExecutionResult>,
) -> String {
    let results_json =
        serde_json::to_string(exec_results).unwrap_or_else(|_| "{}".to_string());

    format!(
        "El cliente preguntó: \"{query}\"\n\n\
         DATOS DEL INVENTARIO (usa estos datos concretos en tu respuesta):\n\
         - Resultados de ejecución: {results_json}\n\
         - Función detectada: {function}\n\
         - Confianza: {score:.0}%\n\n\
         Genera una respuesta natural y CONCRETA usando los datos proporcionados.\n\
         Incluye precios, cantidades y datos específicos cuando sea posible.",
        query = query,
        results_json = results_json,
        function = route.function,
        score = route.score * 100.0,
    )
}

fn template_response(route: &RouteResult) -> String {
    format!(
        "Entendido ✅. Identifiqué que tu solicitud se relaciona con la función \
         **{}** (score={:.3}).",
        route.function, route.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator {
        reply: Option<String>,
        delay: Duration,
    }

    #[async_trait]
    impl ResponseGenerator for CannedGenerator {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.reply
                .clone()
                .ok_or_else(|| AppError::GenerationError("canned failure".into()))
        }
    }

    fn route() -> RouteResult {
        RouteResult {
            function: "buscar_producto".into(),
            score: 0.87,
        }
    }

    #[tokio::test]
    async fn template_when_no_generator() {
        let composer = Composer::template_only();
        let reply = composer.respond("hola", &route(), &HashMap::new()).await;
        assert!(reply.contains("buscar_producto"));
        assert!(reply.contains("0.870"));
    }

    #[tokio::test]
    async fn generator_reply_passes_through() {
        let composer = Composer::with_generator(
            Box::new(CannedGenerator {
                reply: Some("¡Tenemos Pan Integral a $0.25! 🍞".into()),
                delay: Duration::ZERO,
            }),
            Duration::from_secs(5),
        );
        let reply = composer
            .respond("¿tienes pan integral?", &route(), &HashMap::new())
            .await;
        assert_eq!(reply, "¡Tenemos Pan Integral a $0.25! 🍞");
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_template() {
        let composer = Composer::with_generator(
            Box::new(CannedGenerator {
                reply: None,
                delay: Duration::ZERO,
            }),
            Duration::from_secs(5),
        );
        let reply = composer.respond("hola", &route(), &HashMap::new()).await;
        assert!(reply.contains("buscar_producto"));
    }

    #[tokio::test]
    async fn slow_generator_times_out_to_template() {
        let composer = Composer::with_generator(
            Box::new(CannedGenerator {
                reply: Some("tarde".into()),
                delay: Duration::from_secs(30),
            }),
            Duration::from_millis(50),
        );
        let reply = composer.respond("hola", &route(), &HashMap::new()).await;
        assert!(reply.contains("buscar_producto"));
    }

    #[test]
    fn user_prompt_carries_execution_data() {
        let mut results = HashMap::new();
        results.insert(
            "buscar_producto".to_string(),
            ExecutionResult {
                function: "buscar_producto".to_string(),
                success: true,
                data: serde_json::json!({ "productos": [] }),
            },
        );
        let prompt = build_user_prompt("¿tienes pan?", &route(), &results);
        assert!(prompt.contains("¿tienes pan?"));
        assert!(prompt.contains("buscar_producto"));
        assert!(prompt.contains("87%"));
    }
}
