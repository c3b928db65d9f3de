//! Property tests over arbitrary input.

use feedloom::ext::CUSTOM_PREFIX;
use feedloom::{detect_feed_type, ParsedFeed, Parser};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_detector_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = detect_feed_type(&bytes);
    }

    #[test]
    fn prop_parser_never_panics_on_markup(body in "[<>/a-z =\"&;!\\[\\]CDAT-]{0,200}") {
        let doc = format!("<rss><channel>{body}</channel></rss>");
        let _ = Parser::default().parse(doc.as_bytes());
        let doc = format!("<feed>{body}</feed>");
        let _ = Parser::default().parse(doc.as_bytes());
    }

    #[test]
    fn prop_extension_order_preserved(values in proptest::collection::vec("[a-z0-9]{1,8}", 1..20)) {
        let mut doc = String::from(
            r#"<rss xmlns:ex="http://example.com/ns"><channel>"#,
        );
        for value in &values {
            doc.push_str(&format!("<ex:tag>{value}</ex:tag><title>t</title><junk>{value}</junk>"));
        }
        doc.push_str("</channel></rss>");

        let ParsedFeed::Rss(feed) = Parser::default().parse(doc.as_bytes()).unwrap() else {
            panic!("expected RSS");
        };

        let captured: Vec<&str> = feed.extensions.values("ex", "tag").collect();
        let expected: Vec<&str> = values.iter().map(String::as_str).collect();
        prop_assert_eq!(&captured, &expected);

        let custom: Vec<&str> = feed.extensions.values(CUSTOM_PREFIX, "junk").collect();
        prop_assert_eq!(&custom, &expected);
    }

    #[test]
    fn prop_title_text_survives(title in "[a-zA-Z0-9 ,.!?]{0,40}") {
        let doc = format!("<feed><title>{title}</title></feed>");
        let ParsedFeed::Atom(feed) = Parser::default().parse(doc.as_bytes()).unwrap() else {
            panic!("expected Atom");
        };
        prop_assert_eq!(feed.title, title.trim());
    }
}
