use quick_xml::{events::Event, Reader};

/// Collects the media URIs (`BaseURL` elements) from a DASH manifest. The
/// rest of the manifest structure is irrelevant here; each URI is converted
/// into a stream candidate by the extractor.
pub fn media_uris(manifest: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(manifest);
    reader.trim_text(true);

    let mut uris = Vec::new();
    let mut in_base_url = false;

    loop {
        match reader.read_event() {
            Err(e) => return Err(e),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                in_base_url = e.name().as_ref() == b"BaseURL";
            }
            Ok(Event::Text(e)) => {
                if in_base_url {
                    if let Ok(uri) = e.unescape() {
                        uris.push(uri.into_owned());
                    }
                }
            }
            Ok(Event::End(_)) => {
                in_base_url = false;
            }
            _ => (),
        }
    }

    Ok(uris)
}
