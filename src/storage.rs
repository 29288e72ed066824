use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::account::{Account, SignConvention};
use crate::error::ChartError;
use crate::forest::Forest;
use crate::node::NodeId;
use crate::numbering::{DecimalScheme, NumberingScheme, Placement};
use crate::transaction::{Side, Transaction};

/// Derives the transaction-log path from the chart path by suffixing the
/// file stem: `accounts.txt` becomes `accounts_transactions.txt`.
pub fn transaction_filename(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_transactions");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

fn corrupt(line: usize, reason: impl Into<String>) -> ChartError {
    ChartError::CorruptPersistedState {
        line,
        reason: reason.into(),
    }
}

impl<S> Forest<S> {
    /// Serializes the chart: one record per line, `number SP description SP
    /// balance`, nesting encoded as two spaces of indentation per level.
    /// Balances keep `Decimal`'s exact display form so that a save of a
    /// loaded file reproduces it byte for byte.
    pub fn write_chart_file<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for root in self.roots() {
            self.write_chart_record(writer, root, 0)?;
        }
        Ok(())
    }

    fn write_chart_record<W: Write>(
        &self,
        writer: &mut W,
        id: NodeId,
        depth: usize,
    ) -> io::Result<()> {
        let node = self.node(id);
        let account = node.account();
        writeln!(
            writer,
            "{:indent$}{} {} {}",
            "",
            account.number(),
            account.description(),
            account.balance(),
            indent = depth * 2
        )?;
        for child in node.children() {
            self.write_chart_record(writer, child, depth + 1)?;
        }
        Ok(())
    }

    /// Whole-file rewrite of the chart at `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_chart_file(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), accounts = self.len(), "saved chart");
        Ok(())
    }

    /// Serializes every account's transaction history, one entry per line,
    /// `number SP amount SP D|C`, accounts in ascending number order and
    /// each account's entries in application order.
    pub fn write_transactions<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut numbers: Vec<u32> = self.index.keys().copied().collect();
        numbers.sort_unstable();
        for number in numbers {
            if let Some(node) = self.find_account(number) {
                for txn in node.account().transactions() {
                    writeln!(writer, "{} {} {}", number, txn.amount(), txn.side().code())?;
                }
            }
        }
        Ok(())
    }

    /// Whole-file rewrite of the transaction log at `path`.
    pub fn save_transactions(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_transactions(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), "saved transaction log");
        Ok(())
    }

    /// Reattaches logged transactions to their accounts without touching
    /// balances; the chart records already hold post-transaction balances.
    pub(crate) fn load_transactions(&mut self, input: &str) -> Result<(), ChartError> {
        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let mut fields = line.split(' ');
            let (number_text, amount_text, side_text) =
                match (fields.next(), fields.next(), fields.next(), fields.next()) {
                    (Some(number), Some(amount), Some(side), None) => (number, amount, side),
                    _ => return Err(corrupt(line_no, "expected 'number amount side'")),
                };
            let number: u32 = number_text
                .parse()
                .map_err(|_| corrupt(line_no, format!("invalid account number '{number_text}'")))?;
            let amount: Decimal = amount_text
                .parse()
                .map_err(|_| corrupt(line_no, format!("invalid amount '{amount_text}'")))?;
            let side = side_text
                .chars()
                .next()
                .filter(|_| side_text.len() == 1)
                .and_then(Side::from_code)
                .ok_or_else(|| corrupt(line_no, format!("invalid side '{side_text}'")))?;
            let txn = Transaction::new(amount, side)
                .map_err(|_| corrupt(line_no, "zero transaction amount"))?;
            self.restore_transaction(number, txn)
                .map_err(|_| corrupt(line_no, format!("transaction for unknown account {number}")))?;
        }
        Ok(())
    }
}

impl<S: NumberingScheme> Forest<S> {
    /// Rebuilds a forest from the indented chart serialization. Any
    /// malformed record, duplicate number, indentation jump or placement
    /// that contradicts the numbering scheme aborts the whole load; no
    /// partially built forest escapes.
    pub fn parse_chart_with(
        scheme: S,
        convention: SignConvention,
        input: &str,
    ) -> Result<Forest<S>, ChartError> {
        let mut forest = Forest::with_policies(scheme, convention);
        // open ancestor path, one (number, node) entry per depth level
        let mut path: Vec<(u32, NodeId)> = Vec::new();
        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim_start_matches(' ');
            if trimmed.is_empty() {
                return Err(corrupt(line_no, "empty record"));
            }
            let indent = line.len() - trimmed.len();
            if indent % 2 != 0 {
                return Err(corrupt(line_no, "indentation is not a multiple of two"));
            }
            let depth = indent / 2;
            if depth > path.len() {
                return Err(corrupt(line_no, "indentation jumps a level"));
            }
            path.truncate(depth);

            let (number_text, rest) = trimmed
                .split_once(' ')
                .ok_or_else(|| corrupt(line_no, "expected 'number description balance'"))?;
            let (description, balance_text) = rest
                .rsplit_once(' ')
                .ok_or_else(|| corrupt(line_no, "expected 'number description balance'"))?;
            let number: u32 = number_text
                .parse()
                .map_err(|_| corrupt(line_no, format!("invalid account number '{number_text}'")))?;
            let balance: Decimal = balance_text
                .parse()
                .map_err(|_| corrupt(line_no, format!("invalid balance '{balance_text}'")))?;

            if forest.index.contains_key(&number) {
                return Err(corrupt(line_no, format!("duplicate account {number}")));
            }
            match forest.scheme.placement(number) {
                None => {
                    return Err(corrupt(
                        line_no,
                        format!("account number {number} is not valid for the numbering scheme"),
                    ))
                }
                Some(Placement::Root) => {
                    if let Some(&(parent_number, _)) = path.last() {
                        return Err(corrupt(
                            line_no,
                            format!("root account {number} nested under {parent_number}"),
                        ));
                    }
                }
                Some(Placement::Under(parent_number)) => match path.last() {
                    Some(&(found, _)) if found == parent_number => {}
                    Some(&(found, _)) => {
                        return Err(corrupt(
                            line_no,
                            format!("account {number} belongs under {parent_number}, found under {found}"),
                        ))
                    }
                    None => {
                        return Err(corrupt(
                            line_no,
                            format!("account {number} belongs under {parent_number}, found at top level"),
                        ))
                    }
                },
            }

            let parent = path.last().map(|&(_, id)| id);
            let account = Account::new(number, description.trim(), balance);
            let id = forest.attach(account, parent);
            path.push((number, id));
        }
        Ok(forest)
    }

    /// Loads the chart at `path` and, when present, the sibling transaction
    /// log named by [`transaction_filename`]. A missing log file means
    /// empty histories; a malformed log line or one naming an unknown
    /// account is `CorruptPersistedState`, exactly like a bad chart record.
    pub fn build_from_file(
        path: impl AsRef<Path>,
        scheme: S,
        convention: SignConvention,
    ) -> Result<Forest<S>, ChartError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)?;
        let mut forest = Forest::parse_chart_with(scheme, convention, &input)?;
        let log_path = transaction_filename(path);
        match fs::read_to_string(&log_path) {
            Ok(log) => forest.load_transactions(&log)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(ChartError::Io(err)),
        }
        debug!(path = %path.display(), accounts = forest.len(), "loaded chart");
        Ok(forest)
    }
}

impl Forest<DecimalScheme> {
    /// [`Forest::parse_chart_with`] under the default policies.
    pub fn parse_chart(input: &str) -> Result<Forest<DecimalScheme>, ChartError> {
        Forest::parse_chart_with(DecimalScheme::default(), SignConvention::default(), input)
    }
}

impl FromStr for Forest<DecimalScheme> {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Forest<DecimalScheme>, ChartError> {
        Forest::parse_chart(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_forest() -> Forest<DecimalScheme> {
        let mut forest = Forest::new();
        forest.add_account(1000, "Assets", dec!(0)).unwrap();
        forest.add_account(1100, "Petty Cash", dec!(0)).unwrap();
        forest.add_account(2000, "Liabilities", dec!(0)).unwrap();
        forest
            .add_transaction(1100, Transaction::new(dec!(500), Side::Debit).unwrap())
            .unwrap();
        forest
            .add_transaction(1100, Transaction::new(dec!(120.25), Side::Credit).unwrap())
            .unwrap();
        forest
            .add_transaction(2000, Transaction::new(dec!(80), Side::Credit).unwrap())
            .unwrap();
        forest
    }

    fn chart_text<S>(forest: &Forest<S>) -> String {
        let mut out = Vec::new();
        forest.write_chart_file(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn log_text<S>(forest: &Forest<S>) -> String {
        let mut out = Vec::new();
        forest.write_transactions(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn transaction_filename_keeps_directory_and_extension() {
        assert_eq!(
            transaction_filename("accounts.txt"),
            PathBuf::from("accounts_transactions.txt")
        );
        assert_eq!(
            transaction_filename("data/chart.dat"),
            PathBuf::from("data/chart_transactions.dat")
        );
        assert_eq!(
            transaction_filename("data/chart"),
            PathBuf::from("data/chart_transactions")
        );
    }

    #[test]
    fn chart_serialization_round_trips() {
        let forest = sample_forest();
        let first = chart_text(&forest);
        let expected = "\
1000 Assets 0
  1100 Petty Cash 379.75
2000 Liabilities -80
";
        assert_eq!(first, expected);

        let reloaded = Forest::parse_chart(&first).unwrap();
        assert_eq!(chart_text(&reloaded), first);
        assert_eq!(reloaded.to_string(), forest.to_string());
    }

    #[test]
    fn descriptions_with_spaces_survive_the_round_trip() {
        let forest = sample_forest();
        let reloaded = Forest::parse_chart(&chart_text(&forest)).unwrap();
        let account = reloaded.find_account(1100).unwrap().account();
        assert_eq!(account.description(), "Petty Cash");
        assert_eq!(account.balance(), dec!(379.75));
    }

    #[test]
    fn transaction_log_is_ordered_and_restores_histories() {
        let forest = sample_forest();
        let log = log_text(&forest);
        let expected = "\
1100 500 D
1100 120.25 C
2000 80 C
";
        assert_eq!(log, expected);

        let mut reloaded = Forest::parse_chart(&chart_text(&forest)).unwrap();
        reloaded.load_transactions(&log).unwrap();
        let cash = reloaded.find_account(1100).unwrap().account();
        // balances come from the chart records, not from re-application
        assert_eq!(cash.balance(), dec!(379.75));
        assert_eq!(cash.transactions().len(), 2);
        assert_eq!(cash.transactions()[0].amount(), dec!(500));
        assert_eq!(log_text(&reloaded), log);
    }

    #[test]
    fn duplicate_record_aborts_the_load() {
        let err = Forest::parse_chart("1000 Assets 0\n1000 Assets 0\n").unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 2, .. }
        ));
    }

    #[test]
    fn indentation_jump_aborts_the_load() {
        let err = Forest::parse_chart("1000 Assets 0\n    1110 Checking 0\n").unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 2, .. }
        ));
    }

    #[test]
    fn odd_indentation_aborts_the_load() {
        let err = Forest::parse_chart("1000 Assets 0\n 1100 Cash 0\n").unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 2, .. }
        ));
    }

    #[test]
    fn placement_contradictions_abort_the_load() {
        // child record at top level
        let err = Forest::parse_chart("1100 Cash 0\n").unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 1, .. }
        ));
        // root record nested under another root
        let err = Forest::parse_chart("1000 Assets 0\n  2000 Liabilities 0\n").unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 2, .. }
        ));
        // child nested under the wrong parent
        let err = Forest::parse_chart(
            "1000 Assets 0\n  1100 Cash 0\n2000 Liabilities 0\n  1200 Receivables 0\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 4, .. }
        ));
    }

    #[test]
    fn malformed_records_abort_the_load() {
        for input in [
            "1000 0\n",
            "10a0 Assets 0\n",
            "1000 Assets ten\n",
            "\n1000 Assets 0\n",
        ] {
            let err = Forest::parse_chart(input).unwrap_err();
            assert!(matches!(
                err,
                ChartError::CorruptPersistedState { line: 1, .. }
            ));
        }
    }

    #[test]
    fn malformed_log_lines_abort_the_load() {
        let mut forest = Forest::parse_chart("1000 Assets 0\n").unwrap();
        for input in [
            "1000 500\n",
            "1000 500 X\n",
            "1000 0 D\n",
            "9999 500 D\n",
        ] {
            let err = forest.load_transactions(input).unwrap_err();
            assert!(matches!(
                err,
                ChartError::CorruptPersistedState { line: 1, .. }
            ));
        }
    }

    #[test]
    fn parses_via_from_str() {
        let forest: Forest = "1000 Assets 12.50\n".parse().unwrap();
        assert_eq!(forest.find_account(1000).unwrap().account().balance(), dec!(12.50));
    }

    #[test]
    fn build_from_file_reads_chart_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("accounts.txt");
        let forest = sample_forest();
        forest.save_to_file(&chart_path).unwrap();
        forest
            .save_transactions(transaction_filename(&chart_path))
            .unwrap();

        let reloaded = Forest::build_from_file(
            &chart_path,
            DecimalScheme::default(),
            SignConvention::DebitPositive,
        )
        .unwrap();
        assert_eq!(chart_text(&reloaded), chart_text(&forest));
        assert_eq!(log_text(&reloaded), log_text(&forest));
    }

    #[test]
    fn build_from_file_without_log_means_empty_histories() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("accounts.txt");
        sample_forest().save_to_file(&chart_path).unwrap();

        let reloaded = Forest::build_from_file(
            &chart_path,
            DecimalScheme::default(),
            SignConvention::DebitPositive,
        )
        .unwrap();
        let cash = reloaded.find_account(1100).unwrap().account();
        assert_eq!(cash.balance(), dec!(379.75));
        assert!(cash.transactions().is_empty());
    }

    #[test]
    fn build_from_file_propagates_missing_chart() {
        let dir = tempfile::tempdir().unwrap();
        let err = Forest::build_from_file(
            dir.path().join("absent.txt"),
            DecimalScheme::default(),
            SignConvention::DebitPositive,
        )
        .unwrap_err();
        match err {
            ChartError::Io(err) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_log_file_aborts_build_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("accounts.txt");
        sample_forest().save_to_file(&chart_path).unwrap();
        fs::write(transaction_filename(&chart_path), "9999 500 D\n").unwrap();

        let err = Forest::build_from_file(
            &chart_path,
            DecimalScheme::default(),
            SignConvention::DebitPositive,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ChartError::CorruptPersistedState { line: 1, .. }
        ));
    }

    #[test]
    fn save_after_reload_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("accounts.txt");
        let forest = sample_forest();
        forest.save_to_file(&chart_path).unwrap();
        let first = fs::read_to_string(&chart_path).unwrap();

        let reloaded = Forest::build_from_file(
            &chart_path,
            DecimalScheme::default(),
            SignConvention::DebitPositive,
        )
        .unwrap();
        reloaded.save_to_file(&chart_path).unwrap();
        assert_eq!(fs::read_to_string(&chart_path).unwrap(), first);
    }
}
