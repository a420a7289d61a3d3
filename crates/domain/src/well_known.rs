//! Typed accessors over the well-known options of section `key`.
//!
//! These are read-only projections of the generic lookup; they store nothing.

use crate::snapshot::ConfigSnapshot;
use crate::system::KEY_SECTION;

/// Well-known options of section `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownKey {
    /// Speech recognition provider.
    AsrMode,
    /// Local ASR host.
    LocalAsrIp,
    /// Local ASR port.
    LocalAsrPort,
    /// Aliyun NLS access key id.
    AliNlsKeyId,
    /// Aliyun NLS access key secret.
    AliNlsKeySecret,
    /// Aliyun NLS app key.
    AliNlsAppKey,
    /// Aliyun TTS access key id.
    AliTtsKeyId,
    /// Aliyun TTS access key secret.
    AliTtsKeySecret,
    /// Aliyun TTS app key.
    AliTtsAppKey,
    /// Azure TTS subscription key.
    MsTtsKey,
    /// Azure TTS region.
    MsTtsRegion,
    /// Baidu emotion app id.
    BaiduEmotionAppId,
    /// Baidu emotion API key.
    BaiduEmotionApiKey,
    /// Baidu emotion secret key.
    BaiduEmotionSecretKey,
    /// LLM API key.
    GptApiKey,
    /// LLM base URL.
    GptBaseUrl,
    /// LLM model name.
    GptModelEngine,
    /// Outbound proxy.
    ProxyConfig,
    /// LTP mode.
    LtpMode,
    /// TTS provider.
    TtsModule,
    /// Volcano TTS app id.
    VolcanoTtsAppId,
    /// Volcano TTS access token.
    VolcanoTtsAccessToken,
    /// Volcano TTS cluster.
    VolcanoTtsCluster,
    /// Volcano TTS voice type.
    VolcanoTtsVoiceType,
    /// Start mode.
    StartMode,
    /// Service URL.
    ServiceUrl,
}

impl WellKnownKey {
    /// Every well-known key.
    pub const ALL: [Self; 26] = [
        Self::AsrMode,
        Self::LocalAsrIp,
        Self::LocalAsrPort,
        Self::AliNlsKeyId,
        Self::AliNlsKeySecret,
        Self::AliNlsAppKey,
        Self::AliTtsKeyId,
        Self::AliTtsKeySecret,
        Self::AliTtsAppKey,
        Self::MsTtsKey,
        Self::MsTtsRegion,
        Self::BaiduEmotionAppId,
        Self::BaiduEmotionApiKey,
        Self::BaiduEmotionSecretKey,
        Self::GptApiKey,
        Self::GptBaseUrl,
        Self::GptModelEngine,
        Self::ProxyConfig,
        Self::LtpMode,
        Self::TtsModule,
        Self::VolcanoTtsAppId,
        Self::VolcanoTtsAccessToken,
        Self::VolcanoTtsCluster,
        Self::VolcanoTtsVoiceType,
        Self::StartMode,
        Self::ServiceUrl,
    ];

    /// Option name inside section `key`.
    #[must_use]
    pub const fn option(self) -> &'static str {
        match self {
            Self::AsrMode => "asr_mode",
            Self::LocalAsrIp => "local_asr_ip",
            Self::LocalAsrPort => "local_asr_port",
            Self::AliNlsKeyId => "ali_nls_key_id",
            Self::AliNlsKeySecret => "ali_nls_key_secret",
            Self::AliNlsAppKey => "ali_nls_app_key",
            Self::AliTtsKeyId => "ali_tss_key_id",
            Self::AliTtsKeySecret => "ali_tss_key_secret",
            Self::AliTtsAppKey => "ali_tss_app_key",
            Self::MsTtsKey => "ms_tts_key",
            Self::MsTtsRegion => "ms_tts_region",
            Self::BaiduEmotionAppId => "baidu_emotion_app_id",
            Self::BaiduEmotionApiKey => "baidu_emotion_api_key",
            Self::BaiduEmotionSecretKey => "baidu_emotion_secret_key",
            Self::GptApiKey => "gpt_api_key",
            Self::GptBaseUrl => "gpt_base_url",
            Self::GptModelEngine => "gpt_model_engine",
            Self::ProxyConfig => "proxy_config",
            Self::LtpMode => "ltp_mode",
            Self::TtsModule => "tts_module",
            Self::VolcanoTtsAppId => "volcano_tts_appid",
            Self::VolcanoTtsAccessToken => "volcano_tts_access_token",
            Self::VolcanoTtsCluster => "volcano_tts_cluster",
            Self::VolcanoTtsVoiceType => "volcano_tts_voice_type",
            Self::StartMode => "start_mode",
            Self::ServiceUrl => "fay_url",
        }
    }

    /// Key path that resolves this option.
    #[must_use]
    pub fn key_path(self) -> String {
        format!("system.{}", self.option())
    }
}

/// Read-only typed view of a snapshot's well-known options.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown<'a> {
    snapshot: &'a ConfigSnapshot,
}

impl<'a> WellKnown<'a> {
    /// Wrap a snapshot.
    #[must_use]
    pub const fn new(snapshot: &'a ConfigSnapshot) -> Self {
        Self { snapshot }
    }

    /// Raw value of a well-known option in section `key`.
    #[must_use]
    pub fn get(self, key: WellKnownKey) -> Option<&'a str> {
        self.snapshot.system.get(KEY_SECTION, key.option())
    }

    /// Non-empty value of a well-known option.
    #[must_use]
    pub fn non_empty(self, key: WellKnownKey) -> Option<&'a str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    /// ASR provider.
    #[must_use]
    pub fn asr_mode(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::AsrMode)
    }

    /// Local ASR port, when it parses.
    #[must_use]
    pub fn local_asr_port(self) -> Option<u16> {
        self.non_empty(WellKnownKey::LocalAsrPort)?.parse().ok()
    }

    /// TTS provider.
    #[must_use]
    pub fn tts_module(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::TtsModule)
    }

    /// LLM base URL.
    #[must_use]
    pub fn gpt_base_url(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::GptBaseUrl)
    }

    /// LLM model name.
    #[must_use]
    pub fn gpt_model_engine(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::GptModelEngine)
    }

    /// Outbound proxy.
    #[must_use]
    pub fn proxy_config(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::ProxyConfig)
    }

    /// Start mode.
    #[must_use]
    pub fn start_mode(self) -> Option<&'a str> {
        self.non_empty(WellKnownKey::StartMode)
    }
}

impl ConfigSnapshot {
    /// Typed view over the well-known options.
    #[must_use]
    pub const fn well_known(&self) -> WellKnown<'_> {
        WellKnown::new(self)
    }
}
