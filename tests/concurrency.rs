//! One `Parser` shared by many threads; every call gets its own cursor.

use feedloom::{ParsedFeed, Parser};
use pretty_assertions::assert_eq;

fn rss_doc(n: usize) -> String {
    format!(
        r#"<rss version="2.0"><channel xml:base="http://example.org/{n}/">
             <title>Feed {n}</title>
             <item><title>Item {n}</title><link href="post"/></item>
           </channel></rss>"#
    )
}

fn atom_doc(n: usize) -> String {
    format!(
        r#"<feed xmlns="http://www.w3.org/2005/Atom" xml:base="http://example.org/{n}/">
             <title>Feed {n}</title>
             <entry><title>Entry {n}</title><link href="post"/></entry>
           </feed>"#
    )
}

#[test]
fn test_parallel_parses_do_not_interfere() {
    let parser = Parser::default();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let parser = &parser;
                scope.spawn(move || {
                    for _ in 0..25 {
                        let doc = if n % 2 == 0 { rss_doc(n) } else { atom_doc(n) };
                        let expected_title = format!("Feed {n}");
                        let expected_link = format!("http://example.org/{n}/post");

                        match parser.parse(doc.as_bytes()).unwrap() {
                            ParsedFeed::Rss(feed) => {
                                assert_eq!(feed.title, expected_title);
                                assert_eq!(feed.items[0].link(), Some(expected_link.as_str()));
                            }
                            ParsedFeed::Atom(feed) => {
                                assert_eq!(feed.title, expected_title);
                                assert_eq!(feed.entries[0].link(), Some(expected_link.as_str()));
                            }
                            ParsedFeed::Json(_) => panic!("unexpected JSON"),
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn test_failed_parse_does_not_poison_parser() {
    let parser = Parser::default();

    std::thread::scope(|scope| {
        let bad = scope.spawn(|| parser.parse(b"<rss><channel><title>x</channel></rss>"));
        let good = scope.spawn(|| parser.parse(rss_doc(1).as_bytes()));

        assert!(bad.join().unwrap().is_err());
        assert!(good.join().unwrap().is_ok());
    });
}

#[test]
fn test_public_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Parser>();
    assert_send_sync::<ParsedFeed>();
    assert_send_sync::<feedloom::ParseError>();
}
