//! Chromosome-name normalization between UCSC ("chr1", "chrM") and
//! Ensembl ("1", "MT") naming.

/// Alias rules: the `chr` prefix toggle plus one group of names that all
/// denote the mitochondrial chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromAlias {
    mito: &'static [&'static str],
}

impl Default for ChromAlias {
    fn default() -> Self {
        Self { mito: &["chrM", "MT", "chrMT", "M"] }
    }
}

impl ChromAlias {
    /// Candidate spellings for a chromosome name, most specific first.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        let mut out = vec![name.to_string()];

        if self.mito.contains(&name) {
            out.extend(self.mito.iter().filter(|alias| **alias != name).map(|alias| alias.to_string()));
            return out;
        }

        match name.strip_prefix("chr") {
            Some(bare) if !bare.is_empty() => out.push(bare.to_string()),
            _ => out.push(format!("chr{}", name)),
        }
        out
    }

    /// First spelling of `name` accepted by `contains`.
    pub fn resolve<F>(&self, name: &str, contains: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        self.candidates(name).into_iter().find(|c| contains(c))
    }
}

/// Return the first spelling of `name` accepted by `contains`, using the
/// default alias rules.
pub fn resolve_chrom<F>(name: &str, contains: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    ChromAlias::default().resolve(name, contains)
}
