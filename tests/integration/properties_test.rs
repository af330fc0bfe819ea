// NORMALIZATION PROPERTY TESTS
// ============================
// Sweeps over generated atop lines to check unit-conversion invariants.

use atopflux::core::atop::{normalize, FieldValue, Label};

fn tokens(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

// ============================================================================
// CPU
// ============================================================================

#[test]
fn test_cpu_rates_bounded_by_tick_base() {
    for tps in [1, 7, 100, 250, 1000] {
        for ncpu in [1, 2, 4, 64] {
            for ticks in [0, 1, tps / 2, tps] {
                let line = format!(
                    "{tps} {ncpu} {t} {t} {t} {t} {t} {t} {t} {t} {t} 0 0 0 0",
                    t = ticks
                );
                let n = normalize(&Label::Cpu, &tokens(&line)).unwrap();

                for key in [
                    "sys", "user", "nice", "idle", "wait", "irq", "softirq", "steal", "guest",
                ] {
                    let v = n.fields[&format!("cpu.{}", key)].as_f64();
                    assert!((0.0..=1.0).contains(&v), "tps={} {}={}", tps, key, v);
                }

                let idle = n.fields["cpu.idle"].as_f64();
                let usage = n.fields["cpu.usage"].as_f64();
                assert!((usage - (1.0 - idle / ncpu as f64)).abs() < 1e-9);
            }
        }
    }
}

// ============================================================================
// MEM
// ============================================================================

#[test]
fn test_mem_bytes_are_page_multiples() {
    for page_size in [512_i64, 4096, 16384, 65536] {
        for huge in [2048_i64, 1_048_576] {
            for seed in 1..20_i64 {
                let counts: Vec<String> = (0..11)
                    .map(|i| ((seed * 37 + i * 11) % 997).to_string())
                    .collect();
                let line = format!(
                    "{} {} {} {} {} 0 0",
                    page_size,
                    counts.join(" "),
                    huge,
                    seed * 3,
                    seed
                );
                let n = normalize(&Label::Mem, &tokens(&line)).unwrap();

                assert!(!n.fields.contains_key("mem.page_size"));
                assert!(!n.fields.contains_key("mem.huge_page_size"));

                for (key, value) in &n.fields {
                    let FieldValue::Int(bytes) = value else {
                        assert_eq!(key, "mem.usage");
                        continue;
                    };
                    let unit = if key == "mem.htotal" || key == "mem.hfree" {
                        huge
                    } else {
                        page_size
                    };
                    assert_eq!(bytes % unit, 0, "{} = {}", key, bytes);
                }
            }
        }
    }
}

// ============================================================================
// DSK
// ============================================================================

#[test]
fn test_dsk_sector_conversion() {
    for (disk, read_sect, write_sect) in [
        ("sda", 0, 0),
        ("sdb", 1, 2),
        ("nvme0n1", 123_456, 654_321),
        ("dm-0", 9_999_999, 1),
    ] {
        let line = format!("{} 10 5 {} 6 {} 0 0", disk, read_sect, write_sect);
        let n = normalize(&Label::Dsk, &tokens(&line)).unwrap();

        assert_eq!(n.fields["dsk.read_bytes"], FieldValue::Int(read_sect * 512));
        assert_eq!(n.fields["dsk.write_bytes"], FieldValue::Int(write_sect * 512));
        assert_eq!(n.tags["disk"], disk);
        assert!(n.fields.keys().all(|k| k.starts_with("dsk.")));
    }
}

#[test]
fn test_extra_trailing_tokens_are_ignored() {
    let base = "sda 250 10 80 20 160 0 0";
    let padded = format!("{} 99 98 97", base);
    let a = normalize(&Label::Dsk, &tokens(base)).unwrap();
    let b = normalize(&Label::Dsk, &tokens(&padded)).unwrap();
    assert_eq!(a, b);
}
