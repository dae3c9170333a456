use macros::traceable;

traceable! {
    MiscError {
        #[error("Failed to serialize value: {err}")]
        SerializeError => tracing::Level::ERROR,

        #[error("Failed to deserialize value: {err}")]
        DeserializeError => tracing::Level::ERROR,

        #[error("Invalid glob pattern {pattern}: {err}")]
        InvalidPattern { pattern: String } => tracing::Level::WARN,

        #[no_source]
        #[error("Invalid schedule time: {value}")]
        InvalidScheduleTime { value: String } => tracing::Level::WARN,
    }
}
