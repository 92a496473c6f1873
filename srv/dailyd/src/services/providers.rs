use actix_web::http::StatusCode;
use futures_util::future::LocalBoxFuture;
use log::{debug, info};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::errors::ProviderError;
use crate::models::Gloss;
use crate::services::resolver::DefinitionProvider;

const MAX_BODY_BYTES: usize = 1 << 20;

/// Looks words up in a dictionaryapi.dev-compatible JSON API
pub struct FreeDictionaryProvider {
    base_url: String,
}

#[derive(Deserialize)]
struct ApiEntry {
    #[serde(default)]
    meanings: Vec<ApiMeaning>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMeaning {
    #[serde(default)]
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<ApiDefinition>,
}

#[derive(Deserialize)]
struct ApiDefinition {
    #[serde(default)]
    definition: Option<String>,
}

impl FreeDictionaryProvider {
    pub fn new(base_url: &str) -> Self {
        FreeDictionaryProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Pick the first meaning that carries a definition
fn gloss_from_entries(entries: &[ApiEntry]) -> Option<Gloss> {
    entries
        .iter()
        .flat_map(|entry| entry.meanings.iter())
        .find_map(|meaning| {
            let definition = meaning
                .definitions
                .iter()
                .filter_map(|d| d.definition.as_deref())
                .map(str::trim)
                .find(|d| !d.is_empty())?;
            Some(Gloss {
                part_of_speech: meaning.part_of_speech.clone(),
                definition: Some(definition.to_string()),
            })
        })
}

impl DefinitionProvider for FreeDictionaryProvider {
    fn name(&self) -> &str {
        "dictionary-api"
    }

    fn lookup<'a>(&'a self, word: &'a str) -> LocalBoxFuture<'a, Result<Gloss, ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/{}", self.base_url, word);
            debug!("Querying {}", url);

            let client = awc::Client::default();
            let mut response = client
                .get(&url)
                .insert_header(("Accept", "application/json"))
                .send()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound);
            }
            if !status.is_success() {
                return Err(ProviderError::Status(status.as_u16()));
            }

            let entries: Vec<ApiEntry> = response
                .json()
                .limit(MAX_BODY_BYTES)
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()))?;

            // An entry with no usable meaning still proves the word exists
            Ok(gloss_from_entries(&entries).unwrap_or_default())
        })
    }
}

/// Looks words up on a dictd server (RFC 2229)
pub struct DictdProvider {
    host: String,
}

impl DictdProvider {
    pub fn new(host: &str) -> Self {
        DictdProvider {
            host: host.to_string(),
        }
    }

    /// Send DEFINE and collect the text of every returned definition.
    /// Returns an empty string when the server has no match.
    async fn query(&self, word: &str) -> Result<String, ProviderError> {
        debug!("Connecting to dictd host: {} for word: {}", self.host, word);
        let stream = TcpStream::connect(&self.host).await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut line = String::new();
        reader.read_line(&mut line).await?;
        if !line.starts_with("220") {
            return Err(ProviderError::Transport(format!(
                "unexpected greeting: {}",
                line.trim()
            )));
        }

        write_half
            .write_all(format!("DEFINE * {}\r\n", word).as_bytes())
            .await?;

        let mut response = String::new();
        let mut in_text = false;

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);

            if in_text {
                if trimmed == "." {
                    in_text = false;
                    response.push('\n');
                } else {
                    // Lines beginning with '.' are dot-stuffed
                    let content = trimmed.strip_prefix('.').unwrap_or(trimmed);
                    response.push_str(content);
                    response.push('\n');
                }
                continue;
            }

            match trimmed.get(..3) {
                Some("151") => in_text = true,
                Some("150") => {}
                Some("250") => break,
                Some("552") => {
                    debug!("Dictd: no match for {}", word);
                    return Ok(String::new());
                }
                _ => {
                    return Err(ProviderError::Transport(format!(
                        "unexpected reply: {}",
                        trimmed
                    )))
                }
            }
        }

        write_half.write_all(b"QUIT\r\n").await.ok();
        info!("Dictd query complete for {}", word);
        Ok(response)
    }
}

fn expand_part_of_speech(token: &str) -> Option<&'static str> {
    match token {
        "n" => Some("noun"),
        "v" => Some("verb"),
        "adj" => Some("adjective"),
        "adv" => Some("adverb"),
        _ => None,
    }
}

fn is_sense_number(token: &str) -> bool {
    token
        .strip_suffix(':')
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Extract the first sense from a dictd definition body.
/// Understands the WordNet layout (`n 1: text`), falling back to the first
/// line that is not the headword.
pub fn parse_dictd_definition(word: &str, body: &str) -> Option<Gloss> {
    let mut part_of_speech = None;
    let mut sense: Vec<&str> = Vec::new();

    for line in body.lines().map(str::trim) {
        if line.is_empty() {
            if sense.is_empty() {
                continue;
            }
            break;
        }
        if sense.is_empty() && line.eq_ignore_ascii_case(word) {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let second = tokens.next().unwrap_or("");

        let starts_sense = is_sense_number(first)
            || (expand_part_of_speech(first).is_some() && is_sense_number(second));

        if starts_sense && !sense.is_empty() {
            break;
        }

        if let Some(pos) = expand_part_of_speech(first).filter(|_| is_sense_number(second)) {
            part_of_speech = Some(pos.to_string());
            let rest = line[first.len()..].trim_start()[second.len()..].trim_start();
            sense.push(rest);
        } else if is_sense_number(first) {
            sense.push(line[first.len()..].trim_start());
        } else {
            sense.push(line);
        }
    }

    if sense.is_empty() {
        return None;
    }

    Some(Gloss {
        part_of_speech,
        definition: Some(sense.join(" ")),
    })
}

impl DefinitionProvider for DictdProvider {
    fn name(&self) -> &str {
        "dictd"
    }

    fn lookup<'a>(&'a self, word: &'a str) -> LocalBoxFuture<'a, Result<Gloss, ProviderError>> {
        Box::pin(async move {
            let body = self.query(word).await?;
            if body.trim().is_empty() {
                return Err(ProviderError::NotFound);
            }
            Ok(parse_dictd_definition(word, &body).unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_gloss_from_api_entries() {
        let body = r#"[
            {"word": "zonk", "meanings": [
                {"partOfSpeech": "verb", "definitions": [{"definition": "  "}, {"definition": "To hit hard."}]},
                {"partOfSpeech": "noun", "definitions": [{"definition": "A blow."}]}
            ]}
        ]"#;
        let entries: Vec<ApiEntry> = serde_json::from_str(body).unwrap();
        let gloss = gloss_from_entries(&entries).unwrap();
        assert_eq!(gloss.part_of_speech.as_deref(), Some("verb"));
        assert_eq!(gloss.definition.as_deref(), Some("To hit hard."));
    }

    #[test]
    fn test_gloss_from_entries_without_meanings() {
        let entries: Vec<ApiEntry> = serde_json::from_str(r#"[{"word": "zonk"}]"#).unwrap();
        assert!(gloss_from_entries(&entries).is_none());
    }

    #[test]
    fn test_parse_wordnet_definition() {
        let body = "cat\n    n 1: feline mammal usually having thick soft fur\n         and no ability to roar\n    2: an informal term for a youth\n";
        let gloss = parse_dictd_definition("cat", body).unwrap();
        assert_eq!(gloss.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(
            gloss.definition.as_deref(),
            Some("feline mammal usually having thick soft fur and no ability to roar")
        );
    }

    #[test]
    fn test_parse_plain_definition() {
        let body = "Zonk\n  To strike with force.\n\nSecond entry\n";
        let gloss = parse_dictd_definition("zonk", body).unwrap();
        assert_eq!(gloss.part_of_speech, None);
        assert_eq!(gloss.definition.as_deref(), Some("To strike with force."));
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_dictd_definition("cat", "cat\n\n").is_none());
    }

    async fn fake_dictd(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        actix_web::rt::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 fake dictd ready\r\n").await.unwrap();
            let mut buf = [0u8; 256];
            let _ = socket.read(&mut buf).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
        });
        addr
    }

    #[actix_web::test]
    async fn test_dictd_lookup_against_fake_server() {
        let addr = fake_dictd(
            "150 1 definitions retrieved\r\n\
             151 \"cat\" wn \"WordNet\"\r\n\
             cat\r\n\
             \x20   n 1: feline mammal\r\n\
             .\r\n\
             250 ok\r\n",
        )
        .await;

        let gloss = DictdProvider::new(&addr).lookup("cat").await.unwrap();
        assert_eq!(gloss.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(gloss.definition.as_deref(), Some("feline mammal"));
    }

    #[actix_web::test]
    async fn test_dictd_no_match_is_not_found() {
        let addr = fake_dictd("552 no match\r\n").await;
        let result = DictdProvider::new(&addr).lookup("qwxz").await;
        assert!(matches!(result, Err(ProviderError::NotFound)));
    }
}
