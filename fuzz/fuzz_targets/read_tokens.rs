#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_spanner::{Reader, ReaderOptions, TokenType};

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data, ReaderOptions { max_depth: 32 });
    let error = loop {
        match reader.read() {
            Ok(true) => {}
            Ok(false) => return,
            Err(err) => break err,
        }
        let span = reader.span();
        assert!(span.start <= span.end && span.end as usize <= data.len());
        assert!(reader.token_depth() <= 33);
        match reader.token_type() {
            TokenType::Scalar => {
                let _ = reader.resolve();
                let _ = reader.try_get_f64();
            }
            TokenType::Anchor | TokenType::Alias | TokenType::Tag => {
                let _ = reader.get_string();
            }
            _ => {}
        }
    };
    assert_eq!(reader.read(), Err(error));
});
