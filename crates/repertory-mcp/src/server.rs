use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::debug;

use remedy_engine::{classifier, FailurePolicy, RemedyEngine, RepertoryStore, SharedRepertory, Symptom};

use crate::api::{
    CategoryResponse, ClassifySymptomParams, ClassifySymptomResponse, ListCategoryParams,
    LookupRemedyParams, LookupRemedyResponse, MAX_LIMIT, SuggestRemediesParams,
    SuggestRemediesResponse, symptom_type,
};
use crate::cache::SuggestionCache;

#[derive(Clone)]
pub struct RepertoryServer {
    repertory: Arc<SharedRepertory>,
    policy: FailurePolicy,
    cache: Arc<SuggestionCache>,
    tool_router: ToolRouter<RepertoryServer>,
}

impl RepertoryServer {
    pub fn new(
        repertory: Arc<SharedRepertory>,
        policy: FailurePolicy,
        cache: Arc<SuggestionCache>,
    ) -> Self {
        Self {
            repertory,
            policy,
            cache,
            tool_router: Self::tool_router(),
        }
    }

    fn store(&self) -> Result<Arc<RepertoryStore>, String> {
        self.repertory
            .get()
            .map_err(|e| format!("repertory unavailable: {e}"))
    }
}

#[tool_router]
impl RepertoryServer {
    #[tool(description = "Rank remedies for a case. Takes clinical symptoms (with type mental/keynote/physical) and an optional patient profile; returns the best candidates with score, percent_match relative to the top remedy and a clinical justification.")]
    async fn suggest_remedies(
        &self,
        Parameters(params): Parameters<SuggestRemediesParams>,
    ) -> Result<Json<SuggestRemediesResponse>, String> {
        let limit = params.limit.unwrap_or(remedy_engine::ranker::DEFAULT_LIMIT).min(MAX_LIMIT);
        let profile = params.profile();
        let symptoms: Vec<Symptom> = params
            .symptoms
            .into_iter()
            .map(Symptom::from)
            .filter(|s| !s.clinical.trim().is_empty())
            .collect();

        if symptoms.is_empty() {
            return Ok(Json(SuggestRemediesResponse {
                suggestions: Vec::new(),
                cached: false,
            }));
        }

        let key = self.cache.suggestion_key(&symptoms, &profile, limit);
        if let Some(hit) = self.cache.get_suggestions(&key).await {
            debug!(key = %key, "suggestion cache hit");
            return Ok(Json(SuggestRemediesResponse {
                suggestions: hit.into_iter().map(Into::into).collect(),
                cached: true,
            }));
        }

        let engine = RemedyEngine::new(self.store()?).with_policy(self.policy);
        let suggestions = engine
            .suggest_remedies(&symptoms, &profile, limit)
            .map_err(|e| format!("suggest_remedies failed: {e}"))?;

        // An empty list may be a swallowed failure; leave it uncached.
        if !suggestions.is_empty() {
            self.cache.set_suggestions(&key, &suggestions).await;
        }

        Ok(Json(SuggestRemediesResponse {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            cached: false,
        }))
    }

    #[tool(description = "Classify one clinical symptom by importance: level 4 decisive/characteristic, 3 mental/emotional, 2 physical general, 1 common local.")]
    async fn classify_symptom(
        &self,
        Parameters(params): Parameters<ClassifySymptomParams>,
    ) -> Result<Json<ClassifySymptomResponse>, String> {
        let clinical = params.clinical.trim();
        if clinical.is_empty() {
            return Err("clinical must not be empty".to_string());
        }
        let kind = symptom_type(params.kind.as_deref());
        Ok(Json(classifier::classify_text(clinical, kind).into()))
    }

    #[tool(description = "Resolve a remedy abbreviation (e.g. \"Bell\") to its full name and, when known, its signature keyword pattern.")]
    async fn lookup_remedy(
        &self,
        Parameters(params): Parameters<LookupRemedyParams>,
    ) -> Result<Json<LookupRemedyResponse>, String> {
        let store = self.store()?;
        let wanted = params.abbreviation.trim();
        let (abbreviation, full_name) = store
            .lookup_abbreviation(wanted)
            .ok_or_else(|| format!("unknown remedy abbreviation: {wanted}"))?;
        Ok(Json(LookupRemedyResponse {
            abbreviation: abbreviation.to_string(),
            full_name: full_name.to_string(),
            pattern: store.pattern(full_name).map(Into::into),
        }))
    }

    #[tool(description = "List the rubrics of one repertory category (e.g. \"Head\", \"Mind\") with the number of graded remedies in each.")]
    async fn list_category(
        &self,
        Parameters(params): Parameters<ListCategoryParams>,
    ) -> Result<Json<CategoryResponse>, String> {
        let store = self.store()?;
        let wanted = params.category.trim();
        let category = store.find_category(wanted).ok_or_else(|| {
            let titles: Vec<&str> = store.categories().iter().map(|c| c.title.as_str()).collect();
            format!("unknown category: {wanted} (available: {})", titles.join(", "))
        })?;
        Ok(Json(CategoryResponse::from(category)))
    }
}

#[tool_handler]
impl ServerHandler for RepertoryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "repertory-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Homeopathic repertory MCP server. Use suggest_remedies with a case's clinical \
symptoms to get ranked remedy candidates with justifications. classify_symptom shows how a \
single symptom is weighted. lookup_remedy and list_category browse the reference data."
                    .to_string(),
            ),
        }
    }
}
