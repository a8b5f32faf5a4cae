//! The closed catalog of node kinds.

use crate::core::NodeRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every node type the engine knows how to execute.
///
/// The graph editor stores node types as strings; [`NodeKind::parse`] is the
/// only place where those strings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum NodeKind {
    // input
    Input,
    UserInput,
    FormInput,
    TextInput,
    FileUpload,
    ApiInput,
    WebhookTrigger,
    // process
    AiProcess,
    ContentWriter,
    BlogWriter,
    SeoOptimizer,
    EmailWriter,
    SocialMediaWriter,
    ProductDescription,
    AdCopyWriter,
    Summarizer,
    Translator,
    Rewriter,
    HeadlineGenerator,
    KeywordResearch,
    ToneAdjuster,
    Researcher,
    // condition
    Condition,
    QualityGate,
    ScoreCheck,
    ApprovalGate,
    AbTest,
    // preview
    Preview,
    LivePreview,
    EmailPreview,
    MobilePreview,
    // output
    Output,
    ExportOutput,
    PublishOutput,
    EmailOutput,
}

impl NodeKind {
    /// Every kind, grouped by role.
    pub const ALL: [Self; 35] = [
        Self::Input,
        Self::UserInput,
        Self::FormInput,
        Self::TextInput,
        Self::FileUpload,
        Self::ApiInput,
        Self::WebhookTrigger,
        Self::AiProcess,
        Self::ContentWriter,
        Self::BlogWriter,
        Self::SeoOptimizer,
        Self::EmailWriter,
        Self::SocialMediaWriter,
        Self::ProductDescription,
        Self::AdCopyWriter,
        Self::Summarizer,
        Self::Translator,
        Self::Rewriter,
        Self::HeadlineGenerator,
        Self::KeywordResearch,
        Self::ToneAdjuster,
        Self::Researcher,
        Self::Condition,
        Self::QualityGate,
        Self::ScoreCheck,
        Self::ApprovalGate,
        Self::AbTest,
        Self::Preview,
        Self::LivePreview,
        Self::EmailPreview,
        Self::MobilePreview,
        Self::Output,
        Self::ExportOutput,
        Self::PublishOutput,
        Self::EmailOutput,
    ];

    /// Parses a node type string. Returns `None` for unknown types.
    #[must_use]
    pub fn parse(node_type: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == node_type)
    }

    /// The wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::UserInput => "userInput",
            Self::FormInput => "formInput",
            Self::TextInput => "textInput",
            Self::FileUpload => "fileUpload",
            Self::ApiInput => "apiInput",
            Self::WebhookTrigger => "webhookTrigger",
            Self::AiProcess => "aiProcess",
            Self::ContentWriter => "contentWriter",
            Self::BlogWriter => "blogWriter",
            Self::SeoOptimizer => "seoOptimizer",
            Self::EmailWriter => "emailWriter",
            Self::SocialMediaWriter => "socialMediaWriter",
            Self::ProductDescription => "productDescription",
            Self::AdCopyWriter => "adCopyWriter",
            Self::Summarizer => "summarizer",
            Self::Translator => "translator",
            Self::Rewriter => "rewriter",
            Self::HeadlineGenerator => "headlineGenerator",
            Self::KeywordResearch => "keywordResearch",
            Self::ToneAdjuster => "toneAdjuster",
            Self::Researcher => "researcher",
            Self::Condition => "condition",
            Self::QualityGate => "qualityGate",
            Self::ScoreCheck => "scoreCheck",
            Self::ApprovalGate => "approvalGate",
            Self::AbTest => "abTest",
            Self::Preview => "preview",
            Self::LivePreview => "livePreview",
            Self::EmailPreview => "emailPreview",
            Self::MobilePreview => "mobilePreview",
            Self::Output => "output",
            Self::ExportOutput => "exportOutput",
            Self::PublishOutput => "publishOutput",
            Self::EmailOutput => "emailOutput",
        }
    }

    /// The canonical role this kind is dispatched under.
    #[must_use]
    pub fn role(&self) -> NodeRole {
        match self {
            Self::Input
            | Self::UserInput
            | Self::FormInput
            | Self::TextInput
            | Self::FileUpload
            | Self::ApiInput
            | Self::WebhookTrigger => NodeRole::Input,
            Self::AiProcess
            | Self::ContentWriter
            | Self::BlogWriter
            | Self::SeoOptimizer
            | Self::EmailWriter
            | Self::SocialMediaWriter
            | Self::ProductDescription
            | Self::AdCopyWriter
            | Self::Summarizer
            | Self::Translator
            | Self::Rewriter
            | Self::HeadlineGenerator
            | Self::KeywordResearch
            | Self::ToneAdjuster
            | Self::Researcher => NodeRole::Process,
            Self::Condition
            | Self::QualityGate
            | Self::ScoreCheck
            | Self::ApprovalGate
            | Self::AbTest => NodeRole::Condition,
            Self::Preview | Self::LivePreview | Self::EmailPreview | Self::MobilePreview => {
                NodeRole::Preview
            }
            Self::Output | Self::ExportOutput | Self::PublishOutput | Self::EmailOutput => {
                NodeRole::Output
            }
        }
    }

    /// Returns true if this kind rewrites the previous node's content
    /// rather than generating from the user input alone.
    #[must_use]
    pub fn transforms_previous(&self) -> bool {
        matches!(
            self,
            Self::SeoOptimizer
                | Self::Summarizer
                | Self::Translator
                | Self::Rewriter
                | Self::ToneAdjuster
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
