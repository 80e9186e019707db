//! `agents` 및 부속 테이블 (tools, skills, pipelines, schedules, memory)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, Agent, AgentPipelineStep, AgentSchedule, AgentSkill, AgentTool, Database};
use crate::types::{AgentStatus, AgentType, MemoryKind};

/// 에이전트 생성 입력
///
/// 생략된 값은 기본값으로 채움 (model gpt-4, temperature 0.7, max_tokens 2000, memory short)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAgent {
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub memory: Option<MemoryKind>,
    pub config: Option<Value>,
    pub limits: Option<Value>,
    pub billing: Option<Value>,
}

impl NewAgent {
    pub const DEFAULT_MODEL: &'static str = "gpt-4";
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_MAX_TOKENS: i32 = 2000;

    pub fn default_config() -> Value {
        json!({ "retries": 3, "timeout_ms": 30000, "concurrency": 1, "memory_limit": 1024 })
    }

    pub fn default_limits() -> Value {
        json!({ "daily_calls": 1000, "monthly_calls": 30000, "per_user_limit": 100 })
    }

    pub fn default_billing() -> Value {
        json!({ "cost_per_call": 0.01, "cost_per_token": 0.00001 })
    }
}

/// 에이전트 부분 업데이트
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<AgentType>,
    pub status: Option<AgentStatus>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub memory: Option<MemoryKind>,
    pub config: Option<Value>,
    pub limits: Option<Value>,
    pub billing: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub agent_type: Option<String>,
    pub status: Option<String>,
}

pub(crate) fn list_agents_query<'a>(filter: AgentFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM agents WHERE TRUE");
    push_eq(&mut qb, "type", filter.agent_type);
    push_eq(&mut qb, "status", filter.status);
    qb.push(" ORDER BY created_at DESC");
    qb
}

/// export/import JSON 형식
///
/// ```json
/// { "agent": {...}, "tools": [...], "skills": [...], "pipelines": [...], "schedule": {...} | null }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AgentExport {
    pub agent: Agent,
    pub tools: Vec<AgentTool>,
    pub skills: Vec<AgentSkill>,
    pub pipelines: Vec<AgentPipelineStep>,
    pub schedule: Option<AgentSchedule>,
}

/// import 시 읽는 필드만 정의 (나머지 필드는 무시)
#[derive(Debug, Clone, Deserialize)]
pub struct AgentImport {
    pub agent: NewAgent,
    #[serde(default)]
    pub tools: Vec<ImportedTool>,
    #[serde(default)]
    pub skills: Vec<ImportedSkill>,
    #[serde(default)]
    pub pipelines: Vec<ImportedPipelineStep>,
    pub schedule: Option<ImportedSchedule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedTool {
    pub tool_name: String,
    #[serde(default)]
    pub tool_config: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedSkill {
    pub skill_name: String,
    #[serde(default)]
    pub skill_config: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedPipelineStep {
    pub step_order: i32,
    pub step_name: String,
    #[serde(default)]
    pub step_config: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedSchedule {
    pub cron: Option<String>,
    pub timezone: Option<String>,
}

/// `null` 설정은 빈 객체로 저장
fn config_or_empty(config: &Value) -> Value {
    if config.is_null() {
        json!({})
    } else {
        config.clone()
    }
}

impl Database {
    pub async fn create_agent(&self, input: &NewAgent) -> Result<Agent> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (
                name, type, description, avatar_url, model, temperature,
                max_tokens, memory, config, limits, billing
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.agent_type.as_str())
        .bind(&input.description)
        .bind(&input.avatar_url)
        .bind(input.model.as_deref().unwrap_or(NewAgent::DEFAULT_MODEL))
        .bind(input.temperature.unwrap_or(NewAgent::DEFAULT_TEMPERATURE))
        .bind(input.max_tokens.unwrap_or(NewAgent::DEFAULT_MAX_TOKENS))
        .bind(input.memory.unwrap_or(MemoryKind::Short).as_str())
        .bind(input.config.clone().unwrap_or_else(NewAgent::default_config))
        .bind(input.limits.clone().unwrap_or_else(NewAgent::default_limits))
        .bind(input.billing.clone().unwrap_or_else(NewAgent::default_billing))
        .fetch_one(self.pool())
        .await?;
        Ok(agent)
    }

    pub async fn list_agents(&self, filter: AgentFilter) -> Result<Vec<Agent>> {
        let agents = list_agents_query(filter)
            .build_query_as::<Agent>()
            .fetch_all(self.pool())
            .await?;
        Ok(agents)
    }

    pub async fn get_agent(&self, id: Uuid) -> Result<Agent> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(agent)
    }

    pub async fn update_agent(&self, id: Uuid, update: &AgentUpdate) -> Result<Agent> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents SET
                name = COALESCE($2, name),
                type = COALESCE($3, type),
                status = COALESCE($4, status),
                description = COALESCE($5, description),
                avatar_url = COALESCE($6, avatar_url),
                model = COALESCE($7, model),
                temperature = COALESCE($8, temperature),
                max_tokens = COALESCE($9, max_tokens),
                memory = COALESCE($10, memory),
                config = COALESCE($11, config),
                limits = COALESCE($12, limits),
                billing = COALESCE($13, billing),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.agent_type.map(|t| t.as_str()))
        .bind(update.status.map(|s| s.as_str()))
        .bind(&update.description)
        .bind(&update.avatar_url)
        .bind(&update.model)
        .bind(update.temperature)
        .bind(update.max_tokens)
        .bind(update.memory.map(|m| m.as_str()))
        .bind(&update.config)
        .bind(&update.limits)
        .bind(&update.billing)
        .fetch_one(self.pool())
        .await?;
        Ok(agent)
    }

    pub async fn set_agent_status(&self, id: Uuid, status: AgentStatus) -> Result<Agent> {
        let update = AgentUpdate {
            status: Some(status),
            ..Default::default()
        };
        self.update_agent(id, &update).await
    }

    /// 삭제된 row 수 반환 (0이면 존재하지 않던 id)
    pub async fn delete_agent(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM agents WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// 에이전트 메모리 삭제 (configuration_id 기준)
    pub async fn clear_agent_memory(&self, configuration_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM agent_memory WHERE agent_id = $1")
            .bind(configuration_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn attach_tool(&self, agent_id: Uuid, tool_name: &str, tool_config: &Value) -> Result<AgentTool> {
        let tool = sqlx::query_as::<_, AgentTool>(
            r#"
            INSERT INTO agent_tools (agent_id, tool_name, tool_config, enabled)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (agent_id, tool_name)
            DO UPDATE SET tool_config = EXCLUDED.tool_config, enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(agent_id)
        .bind(tool_name)
        .bind(config_or_empty(tool_config))
        .fetch_one(self.pool())
        .await?;
        Ok(tool)
    }

    pub async fn attach_skill(&self, agent_id: Uuid, skill_name: &str, skill_config: &Value) -> Result<AgentSkill> {
        let skill = sqlx::query_as::<_, AgentSkill>(
            r#"
            INSERT INTO agent_skills (agent_id, skill_name, skill_config, enabled)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (agent_id, skill_name)
            DO UPDATE SET skill_config = EXCLUDED.skill_config, enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(agent_id)
        .bind(skill_name)
        .bind(config_or_empty(skill_config))
        .fetch_one(self.pool())
        .await?;
        Ok(skill)
    }

    pub async fn attach_pipeline(
        &self,
        agent_id: Uuid,
        step_order: i32,
        step_name: &str,
        step_config: &Value,
    ) -> Result<AgentPipelineStep> {
        let step = sqlx::query_as::<_, AgentPipelineStep>(
            r#"
            INSERT INTO agent_pipelines (agent_id, step_order, step_name, step_config, enabled)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (agent_id, step_order)
            DO UPDATE SET step_name = EXCLUDED.step_name,
                          step_config = EXCLUDED.step_config,
                          enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(agent_id)
        .bind(step_order)
        .bind(step_name)
        .bind(config_or_empty(step_config))
        .fetch_one(self.pool())
        .await?;
        Ok(step)
    }

    /// 스케줄 설정 (에이전트당 1개, agent_id 기준 upsert)
    pub async fn set_schedule(&self, agent_id: Uuid, cron: &str, timezone: &str) -> Result<AgentSchedule> {
        let schedule = sqlx::query_as::<_, AgentSchedule>(
            r#"
            INSERT INTO agent_schedules (agent_id, cron, timezone, enabled)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (agent_id)
            DO UPDATE SET cron = EXCLUDED.cron, timezone = EXCLUDED.timezone, enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(agent_id)
        .bind(cron)
        .bind(timezone)
        .fetch_one(self.pool())
        .await?;
        Ok(schedule)
    }

    pub async fn disable_schedule(&self, agent_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE agent_schedules SET enabled = FALSE WHERE agent_id = $1")
            .bind(agent_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// 에이전트 + 부속 설정 export (순차 조회)
    pub async fn export_agent(&self, id: Uuid) -> Result<AgentExport> {
        let agent = self.get_agent(id).await?;

        let tools = sqlx::query_as::<_, AgentTool>(
            "SELECT * FROM agent_tools WHERE agent_id = $1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let skills = sqlx::query_as::<_, AgentSkill>(
            "SELECT * FROM agent_skills WHERE agent_id = $1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let pipelines = sqlx::query_as::<_, AgentPipelineStep>(
            "SELECT * FROM agent_pipelines WHERE agent_id = $1 ORDER BY step_order",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let schedule = sqlx::query_as::<_, AgentSchedule>(
            "SELECT * FROM agent_schedules WHERE agent_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(AgentExport {
            agent,
            tools,
            skills,
            pipelines,
            schedule,
        })
    }

    /// export JSON으로부터 새 에이전트 생성
    ///
    /// 생성 → tools → skills → pipelines → schedule 순서로 호출.
    /// 중간 실패 시 이미 생성된 row는 그대로 남음 (롤백 없음)
    pub async fn import_agent(&self, import: &AgentImport) -> Result<Agent> {
        let agent = self.create_agent(&import.agent).await?;

        for tool in &import.tools {
            self.attach_tool(agent.id, &tool.tool_name, &tool.tool_config).await?;
        }
        for skill in &import.skills {
            self.attach_skill(agent.id, &skill.skill_name, &skill.skill_config).await?;
        }
        for step in &import.pipelines {
            self.attach_pipeline(agent.id, step.step_order, &step.step_name, &step.step_config)
                .await?;
        }
        if let Some((cron, timezone)) = import.schedule.as_ref().and_then(ImportedSchedule::cron_and_timezone) {
            self.set_schedule(agent.id, cron, timezone).await?;
        }

        tracing::info!(agent_id = %agent.id, tools = import.tools.len(), "Agent config imported");
        Ok(agent)
    }
}

impl ImportedSchedule {
    /// cron이 있을 때만 스케줄 설정 (timezone 기본값 UTC)
    pub fn cron_and_timezone(&self) -> Option<(&str, &str)> {
        let cron = self.cron.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((cron, self.timezone.as_deref().unwrap_or("UTC")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_agents_query() {
        let qb = list_agents_query(AgentFilter::default());
        assert_eq!(qb.sql(), "SELECT * FROM agents WHERE TRUE ORDER BY created_at DESC");

        let qb = list_agents_query(AgentFilter {
            agent_type: Some("crawler".to_string()),
            status: Some("paused".to_string()),
        });
        assert_eq!(
            qb.sql(),
            "SELECT * FROM agents WHERE TRUE AND type = $1 AND status = $2 ORDER BY created_at DESC"
        );
    }

    #[test]
    fn test_import_payload_accepts_export_shape() {
        // export 결과에는 id, created_at 등 추가 필드가 포함됨
        let json = r#"{
            "agent": {
                "id": "6a0f1e5e-8f0a-4b8e-9a53-0f9c8b1f2d11",
                "name": "scanner",
                "type": "crawler",
                "status": "active",
                "model": "gpt-4",
                "temperature": 0.2,
                "max_tokens": 1000,
                "memory": "long",
                "config": {"retries": 1},
                "limits": {},
                "billing": {}
            },
            "tools": [{"tool_name": "get_balance", "tool_config": {"network": "devnet"}}],
            "skills": [{"skill_name": "summarize"}],
            "pipelines": [{"step_order": 1, "step_name": "fetch", "step_config": {}}],
            "schedule": {"cron": "0 * * * *", "timezone": null}
        }"#;

        let import: AgentImport = serde_json::from_str(json).unwrap();
        assert_eq!(import.agent.name, "scanner");
        assert_eq!(import.agent.agent_type, AgentType::Crawler);
        assert_eq!(import.agent.memory, Some(MemoryKind::Long));
        assert_eq!(import.tools[0].tool_name, "get_balance");
        assert!(import.skills[0].skill_config.is_null());
        assert_eq!(import.pipelines[0].step_order, 1);
        assert_eq!(
            import.schedule.as_ref().and_then(ImportedSchedule::cron_and_timezone),
            Some(("0 * * * *", "UTC"))
        );
    }

    #[test]
    fn test_import_without_optional_sections() {
        let import: AgentImport =
            serde_json::from_str(r#"{"agent": {"name": "w", "type": "worker"}}"#).unwrap();
        assert!(import.tools.is_empty());
        assert!(import.pipelines.is_empty());
        assert!(import.schedule.is_none());
    }

    #[test]
    fn test_schedule_without_cron_is_skipped() {
        let schedule = ImportedSchedule {
            cron: Some("  ".to_string()),
            timezone: Some("Asia/Seoul".to_string()),
        };
        assert_eq!(schedule.cron_and_timezone(), None);
    }

    #[test]
    fn test_null_config_stored_as_empty_object() {
        assert_eq!(config_or_empty(&Value::Null), json!({}));
        assert_eq!(config_or_empty(&json!({"a": 1})), json!({"a": 1}));
    }
}
