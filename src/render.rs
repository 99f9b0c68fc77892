use axum::http::header;
use axum::response::{IntoResponse, Response};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::borrow::Cow;

use crate::types::{InboundImage, Prediction};

pub const AUDIO_FILENAME: &str = "response.mp3";

/// Upload form, optionally followed by the submitted image and an
/// auto-playing audio verdict.
pub fn page(image: Option<&InboundImage>, audio: Option<&[u8]>) -> String {
    let image = image
        .map(|image| {
            format!(
                "<image alt='hotdog or not' src='{}' height='300'/>",
                escape(&image_src(image))
            )
        })
        .unwrap_or_default();
    let audio = audio
        .map(|audio| {
            format!(
                "<audio controls='controls' autobuffer='autobuffer' autoplay='autoplay'>\
                 <source src='data:audio/mp3;base64,{}' /></audio>",
                STANDARD.encode(audio)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html>
  <head><title>Hotdog or Not hotdog</title></head>
  <body>
    <form action="" method="POST" enctype="multipart/form-data">
      <p>Upload an image to see if it's a Hotdog or Not hotdog.</p>
      <label>Image:</label>
      <input type="file" name="image" accept="image/png, image/jpeg" required />
      <button type="submit">Upload</button>
    </form>
    <section>
      {image}
      <br />
      {audio}
    </section>
  </body>
</html>"#
    )
}

/// One `{label} ({percent}%)` line per label, in service order.
pub fn label_list(labels: &[Prediction]) -> String {
    labels
        .iter()
        .map(|label| {
            let percent = (label.score.unwrap_or(0.0) * 100.0).round() as i64;
            format!("{} ({percent}%)", escape(&label.label))
        })
        .collect::<Vec<_>>()
        .join("<br />")
}

pub fn audio_response(audio: axum::body::Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("filename=\"{AUDIO_FILENAME}\""),
            ),
        ],
        audio,
    )
        .into_response()
}

fn image_src(image: &InboundImage) -> Cow<'_, str> {
    match image.uri() {
        Some(uri) => Cow::Borrowed(uri),
        None => Cow::Owned(format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(&image.bytes)
        )),
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_form_has_no_media() {
        let html = page(None, None);
        assert!(html.contains(r#"<input type="file" name="image""#));
        assert!(!html.contains("<image"));
        assert!(!html.contains("<audio"));
    }

    #[test]
    fn uploaded_image_is_inlined_as_data_uri() {
        let image = InboundImage::uploaded(b"jpeg".to_vec().into());
        let html = page(Some(&image), Some(&b"ID3"[..]));
        assert!(html.contains("src='data:image/jpeg;base64,anBlZw=='"));
        assert!(html.contains("<source src='data:audio/mp3;base64,SUQz' />"));
        assert!(html.contains("autoplay='autoplay'"));
    }

    #[test]
    fn fetched_image_links_original_uri_escaped() {
        let image = InboundImage::fetched(
            "https://example.com/a.jpg?x=1&y='2'",
            b"jpeg".to_vec().into(),
        );
        let html = page(Some(&image), None);
        assert!(html.contains("src='https://example.com/a.jpg?x=1&amp;y=&#39;2&#39;'"));
        assert!(!html.contains("base64,anBlZw"));
    }

    #[test]
    fn label_list_rounds_percentages_in_order() {
        let labels = [
            Prediction::new("Dog", 0.934),
            Prediction::new("Pet", 0.886),
            Prediction {
                label: "Snout".into(),
                score: None,
            },
        ];
        assert_eq!(label_list(&labels), "Dog (93%)<br />Pet (89%)<br />Snout (0%)");
    }

    #[test]
    fn exact_half_percent_rounds_away_from_zero() {
        let labels = [Prediction::new("Bun", 0.125), Prediction::new("Relish", 0.375)];
        assert_eq!(label_list(&labels), "Bun (13%)<br />Relish (38%)");
    }

    #[test]
    fn empty_label_list_is_empty() {
        assert_eq!(label_list(&[]), "");
    }

    #[test]
    fn audio_response_sets_download_headers() {
        let response = audio_response(axum::body::Bytes::from_static(b"ID3"));
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "filename=\"response.mp3\"");
    }
}
