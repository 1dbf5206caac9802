// The shared catalog is read from many threads at once.
mod support;

use anyhow::{Result, anyhow};
use intrinsics_dude::{Catalog, TargetFeatures, builtin_catalog};
use std::thread;

const TOKENS: [&str; 6] = [
    "_mm512_mask_add_epi32",
    "_MM256_FMADD_PS",
    "_mm_blendv_epi8",
    "_bswap",
    "__m512i",
    "_mm_frobnicate_ps",
];

fn answers(catalog: &Catalog) -> Vec<(Option<String>, Option<String>, usize)> {
    let (target, _) = TargetFeatures::from_list("SSE SSE2 AVX AVX2 FMA");
    TOKENS
        .iter()
        .map(|token| {
            (
                catalog.describe(token).map(str::to_string),
                catalog.required_features(token).map(|set| set.to_string()),
                catalog.complete(&token[..token.len().min(8)], &target, 80).len(),
            )
        })
        .collect()
}

#[test]
fn parallel_readers_agree_with_sequential_answers() -> Result<()> {
    support::init_tracing();
    let catalog = builtin_catalog().map_err(|err| anyhow!("{err}"))?;
    let expected = answers(catalog);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                let catalog = builtin_catalog().map_err(|err| err.to_string())?;
                Ok::<_, String>((catalog as *const Catalog as usize, answers(catalog)))
            })
        })
        .collect();

    for handle in handles {
        let (address, seen) = handle
            .join()
            .map_err(|_| anyhow!("reader thread panicked"))?
            .map_err(|err| anyhow!(err))?;
        assert_eq!(address, catalog as *const Catalog as usize);
        assert_eq!(seen, expected);
    }
    Ok(())
}
