//! Builds the availability-review prompt sent to the model.

use serde_json::Value;

use crate::config::Language;

/// Replaced with the pretty-printed resource JSON.
const RESOURCES_PLACEHOLDER: &str = "{{resources}}";

const PROMPT_JA: &str = r#"AWSのTerraformコードの可用性を評価してください。AWS Well-Architected Frameworkの信頼性の柱に基づいて分析し、
インフラストラクチャの可用性を向上させる具体的な提案を提示してください。

以下のJSON形式のTerraformリソースを分析してください:

```json
{{resources}}
```

評価項目:
1. マルチAZ構成: リソースが複数のアベイラビリティーゾーンにデプロイされているか
2. 単一障害点(SPOF): システム内に単一障害点が存在するか
3. ロードバランサーの設定: 適切に設定されているか
4. オートスケーリングの設定: 需要の変動に対応できるか
5. バックアップと復旧メカニズム: データ損失からの保護と復旧手段
6. タイムアウト設定とリトライ機構: 一時的な障害からの回復
7. その他の可用性関連の設定

分析結果を以下のJSON形式のみで回答してください:

```json
{
  "overview": "インフラストラクチャの可用性に関する全体的な評価",
  "availability_score": 整数（0-100）,
  "suggested_slo": {
    "availability_target": "推奨する可用性目標（例: 99.9%）",
    "rationale": "その目標を推奨する根拠"
  },
  "findings": [
    {
      "category": "カテゴリ名（例: マルチAZ構成、SPOF、バックアップなど）",
      "severity": "高/中/低",
      "description": "詳細な説明",
      "recommendation": "改善のための具体的な提案",
      "effort": "高/中/低（実装難易度）",
      "risk_impact": "高/中/低（放置した場合のリスク影響度）"
    }
  ],
  "recommendations": [
    {
      "priority": "高/中/低",
      "description": "推奨事項の詳細説明",
      "effort": "高/中/低（実装難易度）",
      "cost_impact": "コストへの影響",
      "terraform_example": "実装例（Terraformコード）"
    }
  ]
}
```

高可用性の観点から重要な問題に焦点を当て、最も影響の大きい改善策を優先してください。
"#;

const PROMPT_EN: &str = r#"Please evaluate the availability of AWS resources defined in the Terraform code below.
Analyze based on the AWS Well-Architected Framework's Reliability pillar and provide
specific recommendations to improve the infrastructure's availability.

Analyze the following Terraform resources in JSON format:

```json
{{resources}}
```

Evaluation criteria:
1. Multi-AZ Configuration: Are resources deployed across multiple Availability Zones?
2. Single Points of Failure (SPOF): Are there any single points of failure in the system?
3. Load Balancer Configuration: Are load balancers properly configured?
4. Auto Scaling Configuration: Can the system handle demand fluctuations?
5. Backup and Recovery Mechanisms: Protection against data loss and recovery methods
6. Timeout Settings and Retry Mechanisms: Recovery from temporary failures
7. Other availability-related configurations

Answer only with the following JSON format:

```json
{
  "overview": "Overall assessment of the infrastructure's availability",
  "availability_score": integer (0-100),
  "suggested_slo": {
    "availability_target": "Recommended availability target (e.g., 99.9%)",
    "rationale": "Why this target fits the architecture"
  },
  "findings": [
    {
      "category": "Category name (e.g., Multi-AZ, SPOF, Backup, etc.)",
      "severity": "high/medium/low",
      "description": "Detailed description",
      "recommendation": "Specific recommendations for improvement",
      "effort": "high/medium/low (implementation effort)",
      "risk_impact": "high/medium/low (impact if left unaddressed)"
    }
  ],
  "recommendations": [
    {
      "priority": "high/medium/low",
      "description": "Detailed description of the recommendation",
      "effort": "high/medium/low (implementation effort)",
      "cost_impact": "Expected cost impact",
      "terraform_example": "Implementation example (Terraform code)"
    }
  ]
}
```

Focus on important issues from a high availability perspective and prioritize improvements
with the most significant impact.
"#;

/// Renders prompts in one language.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    language: Language,
}

impl PromptBuilder {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// The review prompt with `resources` embedded as pretty-printed JSON.
    pub fn availability_prompt(&self, resources: &Value) -> String {
        let template = match self.language {
            Language::Ja => PROMPT_JA,
            Language::En => PROMPT_EN,
        };
        template.replace(RESOURCES_PLACEHOLDER, &format_resources(resources))
    }
}

/// Pretty JSON, or `{}` when there is nothing to analyze.
fn format_resources(resources: &Value) -> String {
    let empty = match resources {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return "{}".to_string();
    }
    serde_json::to_string_pretty(resources).unwrap_or_else(|_| resources.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn japanese_prompt_embeds_resources() {
        let resources = json!({"aws_db_instance": [{"__tfmeta_path": "main.tf", "multi_az": false}]});
        let prompt = PromptBuilder::new(Language::Ja).availability_prompt(&resources);
        assert!(prompt.contains("マルチAZ構成"));
        assert!(prompt.contains("\"multi_az\": false"));
        assert!(!prompt.contains(RESOURCES_PLACEHOLDER));
    }

    #[test]
    fn english_prompt_lists_seven_criteria() {
        let prompt = PromptBuilder::new(Language::En).availability_prompt(&json!({"a": 1}));
        for n in 1..=7 {
            assert!(prompt.contains(&format!("\n{n}. ")), "criterion {n}");
        }
        assert!(prompt.contains("Reliability pillar"));
    }

    #[test]
    fn prompt_describes_full_schema() {
        for language in [Language::Ja, Language::En] {
            let prompt = PromptBuilder::new(language).availability_prompt(&json!({}));
            for key in [
                "\"overview\"",
                "\"availability_score\"",
                "\"suggested_slo\"",
                "\"findings\"",
                "\"effort\"",
                "\"risk_impact\"",
                "\"recommendations\"",
                "\"cost_impact\"",
                "\"terraform_example\"",
            ] {
                assert!(prompt.contains(key), "{key} missing for {language:?}");
            }
        }
    }

    #[test]
    fn empty_resources_embed_empty_object() {
        let prompt = PromptBuilder::new(Language::En).availability_prompt(&Value::Null);
        assert!(prompt.contains("```json\n{}\n```"));
        assert_eq!(format_resources(&json!({})), "{}");
    }
}
