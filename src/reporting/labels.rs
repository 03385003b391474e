//! Headings and field names used by the terminal and HTML renderers.

use crate::config::Language;

/// One language's worth of report wording.
#[derive(Debug)]
pub struct Labels {
    /// Value for the HTML `lang` attribute.
    pub lang: &'static str,
    pub title: &'static str,
    pub generated_at: &'static str,
    pub overview: &'static str,
    pub score: &'static str,
    pub slo: &'static str,
    pub slo_target: &'static str,
    pub slo_rationale: &'static str,
    pub findings: &'static str,
    pub category: &'static str,
    pub severity: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
    pub effort: &'static str,
    pub risk_impact: &'static str,
    pub recommendations: &'static str,
    pub recommendation_n: &'static str,
    pub priority: &'static str,
    pub cost_impact: &'static str,
    pub terraform_example: &'static str,
    pub none: &'static str,
    pub filter: &'static str,
    pub unstructured: &'static str,
    pub error_title: &'static str,
    pub error_prefix: &'static str,
    pub step_resources: &'static str,
    pub step_analysis: &'static str,
    pub step_report: &'static str,
    pub resource_types: &'static str,
    pub model: &'static str,
    pub elapsed: &'static str,
    pub saved: &'static str,
}

pub static JA: Labels = Labels {
    lang: "ja",
    title: "AWS Terraform可用性分析レポート",
    generated_at: "生成日時",
    overview: "概要",
    score: "可用性スコア",
    slo: "推奨SLO（サービスレベル目標）",
    slo_target: "可用性目標",
    slo_rationale: "根拠",
    findings: "検出された問題点",
    category: "カテゴリ",
    severity: "重要度",
    description: "説明",
    recommendation: "推奨対応",
    effort: "実装難易度",
    risk_impact: "リスク影響度",
    recommendations: "改善推奨事項",
    recommendation_n: "推奨事項",
    priority: "優先度",
    cost_impact: "コスト影響",
    terraform_example: "実装例",
    none: "なし",
    filter: "重要度で絞り込み",
    unstructured: "分析結果（構造化されていません）",
    error_title: "分析実行中にエラーが発生しました",
    error_prefix: "エラー: 分析に失敗しました",
    step_resources: "Terraformリソースの読み込み",
    step_analysis: "Bedrockによる可用性分析",
    step_report: "分析結果",
    resource_types: "検出されたリソースタイプ",
    model: "モデル",
    elapsed: "所要時間",
    saved: "保存しました",
};

pub static EN: Labels = Labels {
    lang: "en",
    title: "AWS Terraform Availability Report",
    generated_at: "Generated",
    overview: "Overview",
    score: "Availability score",
    slo: "Suggested SLO",
    slo_target: "Availability target",
    slo_rationale: "Rationale",
    findings: "Findings",
    category: "Category",
    severity: "Severity",
    description: "Description",
    recommendation: "Recommendation",
    effort: "Effort",
    risk_impact: "Risk impact",
    recommendations: "Recommendations",
    recommendation_n: "Recommendation",
    priority: "Priority",
    cost_impact: "Cost impact",
    terraform_example: "Terraform example",
    none: "None",
    filter: "Filter by severity",
    unstructured: "Analysis (unstructured)",
    error_title: "The analysis failed",
    error_prefix: "Error: analysis failed",
    step_resources: "Loading Terraform resources",
    step_analysis: "Analyzing availability with Bedrock",
    step_report: "Analysis result",
    resource_types: "Resource types",
    model: "Model",
    elapsed: "Elapsed",
    saved: "Saved",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::Ja => &JA,
            Language::En => &EN,
        }
    }
}
