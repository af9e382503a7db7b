use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScreenFxError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ScreenFxError::resource_exhausted("x")
            .to_string()
            .contains("resource exhausted:")
    );
    assert!(
        ScreenFxError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        ScreenFxError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScreenFxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: ScreenFxError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, ScreenFxError::Serde(_)));
}
