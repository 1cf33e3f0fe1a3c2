use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use convoy_route::ingest::{build_network, load_pois};
use convoy_route::postprocess::assemble_reply;
use convoy_route::server::run_server;
use convoy_route::{find_path, GraphStore, NodeIndex, SearchRequest, StartKind};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "convoy-route")]
#[command(about = "Heading-aware truck routing over road-network graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build graph documents from a road-network GeoJSON export
    Ingest {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output directory for nodes.json and edges.json
        outdir: PathBuf,
    },
    /// Find a route between two coordinates
    Route {
        /// Directory containing nodes.json and edges.json
        graph: PathBuf,
        /// Start coordinate (lng,lat)
        #[arg(long)]
        from: String,
        /// End coordinate (lng,lat)
        #[arg(long)]
        to: String,
        /// Truck compass heading at the start in degrees, 0 = north
        #[arg(long)]
        heading: Option<f64>,
        /// Start context: road or yard
        #[arg(long, default_value = "road")]
        start_type: StartKind,
        /// Point-of-interest JSON file for drive-time estimates
        #[arg(long)]
        pois: Option<PathBuf>,
        /// Write the full route reply as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Start the HTTP routing API
    Serve {
        /// Directory containing nodes.json and edges.json
        graph: PathBuf,
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Point-of-interest JSON file for drive-time estimates
        #[arg(long)]
        pois: Option<PathBuf>,
    },
}

fn parse_coord(s: &str) -> Result<[f64; 2]> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Coordinate must be in format 'lng,lat'");
    }
    let lng = parts[0].trim().parse::<f64>()?;
    let lat = parts[1].trim().parse::<f64>()?;
    Ok([lng, lat])
}

fn load_poi_file(path: Option<PathBuf>) -> Result<Vec<convoy_route::Poi>> {
    match path {
        Some(path) => {
            load_pois(&path).with_context(|| format!("loading POIs from {}", path.display()))
        }
        None => Ok(Vec::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { input, outdir } => {
            println!("Building network from {}...", input.display());
            let start = Instant::now();

            let summary = build_network(&input, &outdir)
                .with_context(|| format!("building network from {}", input.display()))?;

            println!("\nConversion took {:.2}s", start.elapsed().as_secs_f64());
            println!("Nodes created: {}", summary.nodes);
            println!("Edges created: {}", summary.edges);
            println!("Curved roads: {}", summary.curved);
            println!("Straight roads: {}", summary.straight);
            println!("✓ Saved nodes.json and edges.json to {}", outdir.display());
        }
        Commands::Route {
            graph,
            from,
            to,
            heading,
            start_type,
            pois,
            output,
        } => {
            println!("Loading graph from {}...", graph.display());
            let load_start = Instant::now();
            let store = GraphStore::load(&graph)
                .with_context(|| format!("loading graph documents from {}", graph.display()))?;
            println!(
                "Graph loaded in {:.2}s ({} nodes, {} edges)",
                load_start.elapsed().as_secs_f64(),
                store.node_count(),
                store.edge_count()
            );

            let pois = load_poi_file(pois)?;
            let from_coord = parse_coord(&from)?;
            let to_coord = parse_coord(&to)?;

            let index = NodeIndex::build(&store);
            let start = index
                .snap(from_coord)
                .ok_or_else(|| anyhow::anyhow!("Could not find a road near the start"))?;
            let ends = index.nearest(to_coord, 5);
            if ends.is_empty() {
                anyhow::bail!("Could not find a road near the destination");
            }

            println!("Finding route from {} to {}...", from, to);
            let search_start = Instant::now();

            let request = SearchRequest {
                start,
                ends,
                start_heading: heading,
                start_kind: start_type,
                target: Some(to_coord),
                max_iterations: None,
            };

            match find_path(&store, &request) {
                Some(found) => {
                    let reply = assemble_reply(found, Some(from_coord), &pois);

                    println!("\nRoute found in {:.3}s", search_start.elapsed().as_secs_f64());
                    println!("Distance: {:.1} km", reply.stats.total_km);
                    println!("Drive time: {}", reply.stats.format_drive_time());
                    println!(
                        "Path points: {} raw, {} display",
                        reply.raw_path.len(),
                        reply.display_path.len()
                    );

                    if let Some(path) = output {
                        let file = std::fs::File::create(&path)
                            .with_context(|| format!("creating {}", path.display()))?;
                        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &reply)?;
                        println!("✓ Route written to {}", path.display());
                    }
                }
                None => {
                    println!(
                        "\nNo route found: the destination is unreachable from the start \
                         or lies beyond the search budget."
                    );
                }
            }
        }
        Commands::Serve { graph, port, pois } => {
            println!("Loading graph from {}...", graph.display());
            let start = Instant::now();
            let store = GraphStore::load(&graph)
                .with_context(|| format!("loading graph documents from {}", graph.display()))?;
            println!("Graph loaded in {:.2}s", start.elapsed().as_secs_f64());

            let pois = load_poi_file(pois)?;
            run_server(store, pois, port).await?;
        }
    }

    Ok(())
}
